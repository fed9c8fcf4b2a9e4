//! smart-companion - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes registration and task decomposition.

use smart_companion::{api, config::Config};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smart_companion=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Could not load .env: {}", e),
    }

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, store={:?} ({}), cors_origin={:?}",
        config.model,
        config.store_type,
        config.database_path.display(),
        config.cors_origin
    );

    info!("Starting server on {}:{}", config.host, config.port);
    api::serve(config).await?;

    Ok(())
}
