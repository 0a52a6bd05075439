use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use backend_lib::{
    config::Settings,
    router,
    storage,
    AppState,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// How often expired sessions are swept
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Parish registry web server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file (defaults to ./parish.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let storage = storage::open_storage(&settings)
        .with_context(|| format!("opening data dir {}", settings.data_dir.display()))?;

    let addr = settings.bind_addr;
    let state = Arc::new(AppState::new(storage, settings)?);
    let maintenance = state.spawn_maintenance(MAINTENANCE_INTERVAL);

    let app = router::create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    maintenance.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
