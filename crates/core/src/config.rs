use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("failed to read secrets bundle {path}: {source}")]
    BundleRead {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse secrets bundle {path}: {source}")]
    BundleParse {
        path: String,
        source: dotenvy::Error,
    },
}

/// Text-detection service settings. Credentials themselves come from the
/// standard AWS environment/profile chain; only the region is explicit.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub region: String,
}

/// Connection descriptor for the warehouse holding the WARRANTY and
/// PRODUCT tables.
#[derive(Debug, Clone)]
pub struct WarehouseSettings {
    pub user: String,
    pub password: String,
    /// Account host name.
    pub account: String,
    /// Virtual warehouse name (informational, logged at session open).
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

/// All settings the service needs, resolved once at startup.
/// There are no module-level credential globals anywhere else.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ocr: OcrSettings,
    pub warehouse: WarehouseSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Read every required variable up front so a misconfigured deployment
    /// fails before any OCR or warehouse call is attempted.
    pub fn from_env() -> Result<Self, SecretsError> {
        Ok(Settings {
            ocr: OcrSettings {
                region: require("AWS_DEFAULT_REGION")?,
            },
            warehouse: WarehouseSettings {
                user: require("WAREHOUSE_USER")?,
                password: require("WAREHOUSE_PASSWORD")?,
                account: require("WAREHOUSE_ACCOUNT")?,
                warehouse: require("WAREHOUSE_NAME")?,
                database: require("WAREHOUSE_DATABASE")?,
                schema: require("WAREHOUSE_SCHEMA")?,
            },
            server: ServerSettings {
                bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            },
        })
    }
}

fn require(name: &'static str) -> Result<String, SecretsError> {
    env::var(name).map_err(|_| SecretsError::Missing(name))
}

/// Load a gzip-compressed `.env` bundle (e.g. `prestige_secrets.env.gz`,
/// fetched from the deployment's secrets stage) into the process environment.
/// Variables already present in the environment win, same as a plain `.env`.
pub fn load_secrets_bundle(path: &Path) -> Result<(), SecretsError> {
    let file = File::open(path).map_err(|source| SecretsError::BundleRead {
        path: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(GzDecoder::new(file));
    dotenvy::from_read(reader).map_err(|source| SecretsError::BundleParse {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded secrets bundle");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn missing_variable_names_the_variable() {
        env::remove_var("AWS_DEFAULT_REGION");
        let err = Settings::from_env().unwrap_err();
        assert!(err.to_string().contains("AWS_DEFAULT_REGION"));
    }

    #[test]
    fn load_secrets_bundle_sets_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.env.gz");

        let mut gz = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        gz.write_all(b"PRESTIGE_TEST_BUNDLE_VAR=from-bundle\n").unwrap();
        gz.finish().unwrap();

        load_secrets_bundle(&path).unwrap();
        assert_eq!(
            env::var("PRESTIGE_TEST_BUNDLE_VAR").unwrap(),
            "from-bundle"
        );
    }

    #[test]
    fn load_secrets_bundle_missing_file_is_an_error() {
        let err = load_secrets_bundle(Path::new("/nonexistent/secrets.env.gz")).unwrap_err();
        assert!(matches!(err, SecretsError::BundleRead { .. }));
    }
}
