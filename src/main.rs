//! Feefo product schema service: binary entrypoint.
//! Loads config, starts the daily refresh job and serves the head snippet.

use feefo_product_schema::{app::App, config::AppConfig, metrics::Metrics};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` controls the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feefo=info,feefo_product_schema=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load_default()?;
    tracing::info!(
        target: "feefo",
        api_version = %config.api_version,
        merchant = config.merchant_identifier.as_deref().unwrap_or("-"),
        cadence = %config.cadence,
        store = %config.store_path.display(),
        "starting"
    );

    let metrics = Metrics::init(&config)?;
    let app = App::new(config);
    app.start();
    app.serve(metrics.router()).await
}
