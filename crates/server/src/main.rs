use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use prestige_ocr::{TextDetector, TextractDetector};
use prestige_warehouse::{PgWarehouse, Warehouse};

mod pipeline;
mod present;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Plain .env for local runs; the deployed service points SECRETS_FILE at
    // a gzip-compressed bundle fetched from the secrets stage.
    dotenvy::dotenv().ok();
    if let Ok(bundle) = std::env::var("SECRETS_FILE") {
        prestige_core::load_secrets_bundle(&PathBuf::from(&bundle))
            .with_context(|| format!("failed to load secrets bundle {bundle}"))?;
    }

    // Resolve all settings before touching the network.
    let settings = prestige_core::Settings::from_env().context("incomplete configuration")?;

    let detector: Arc<dyn TextDetector> =
        Arc::new(TextractDetector::connect(&settings.ocr.region).await);
    let warehouse: Arc<dyn Warehouse> = Arc::new(PgWarehouse::new(&settings.warehouse));

    let app = routes::router(Arc::new(routes::AppState {
        detector,
        warehouse,
    }));

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind_addr))?;
    tracing::info!(addr = %settings.server.bind_addr, "warranty checker listening");
    axum::serve(listener, app).await?;
    Ok(())
}
