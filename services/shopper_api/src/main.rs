use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod gallery;
mod routes;
mod store;
mod upload;

use config::Config;
use routes::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(&config.log_filter)).init();

    std::fs::create_dir_all(&config.upload_dir)?;
    let addr = config.bind.clone();
    info!(
        target = "shopper",
        uploads = %config.upload_dir.display(),
        orders = %config.state_dir.display(),
        base_url = %config.base_url,
        "storage ready"
    );

    let app = router(AppState::new(config));
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
