//! Bioactivity Prediction Web Server
//!
//! Run with: cargo run -p bioactivity-web

use tracing::info;
use tracing_subscriber::EnvFilter;

use bioactivity_common::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bioactivity=debug,tower_http=debug,info")),
        )
        .init();

    info!("Starting bioactivity prediction server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!(
        "Configuration loaded. Target: {}, model: {}, descriptor list: {}",
        config.model.target, config.model.path, config.model.descriptor_list
    );
    info!("PaDEL-Descriptor: {} -jar {}", config.padel.java, config.padel.jar);

    let bind_addr = config.server.bind.clone();

    // Build app state and router
    let state = bioactivity_web::state::AppState::new(config)?;
    let router = bioactivity_web::router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Web GUI listening on http://{}", bind_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
