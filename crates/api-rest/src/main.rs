//! Healthvault REST API server binary.
//!
//! Loads configuration from the environment, connects to the SQLite
//! database, and serves the REST surface with Swagger UI at `/swagger-ui`.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use healthvault_api_rest::{router, AppState};
use healthvault_core::{db, CoreConfig};
use healthvault_files::ReportStore;

/// Entry point for the Healthvault REST API server.
///
/// # Environment Variables
/// - `HEALTHVAULT_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `HEALTHVAULT_BOOTSTRAP_SCHEMA`: When "1", create missing tables on start
///
/// See [`CoreConfig::from_env`] for the remaining configuration knobs.
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration is missing or invalid,
/// - the database or report store cannot be opened, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("healthvault_api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr =
        std::env::var("HEALTHVAULT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_env()?);

    tracing::info!("-- Starting Healthvault REST API on {}", addr);

    let pool = db::connect(cfg.database_url()).await?;
    if std::env::var("HEALTHVAULT_BOOTSTRAP_SCHEMA").as_deref() == Ok("1") {
        db::apply_schema(&pool).await?;
    }

    let reports = ReportStore::new(cfg.reports_dir())?;

    let state = AppState { pool, cfg, reports };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
