use anyhow::Context;
use clap::Parser;
use deployment::Deployment;
use server::{DeploymentImpl, build_router, config::ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use utils::log::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    let deployment = DeploymentImpl::new(config.deployment_config())
        .await
        .context("failed to initialize deployment")?;

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    info!(
        addr = %listener.local_addr()?,
        data_dir = %config.data_dir.display(),
        version = deployment.version(),
        "hanja server listening"
    );

    axum::serve(listener, build_router(deployment))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
