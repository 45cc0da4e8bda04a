pub mod config;
pub mod upload;

pub use config::{
    load_secrets_bundle, OcrSettings, SecretsError, ServerSettings, Settings, WarehouseSettings,
};
pub use upload::ImageKind;
