//! MCP tool/resource host process.
//!
//! Serves `AssistantService` over streamable HTTP at `/mcp`. A missing
//! `DATABASE_URL` is fatal before the listener is opened.

use anyhow::Context;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use tracing_subscriber::EnvFilter;
use voxsql::config::ServerConfig;
use voxsql::service::AssistantService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env().context("server configuration")?;
    let database_url = config.database_url.clone();

    let service = StreamableHttpService::new(
        move || Ok(AssistantService::new(database_url.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;

    tracing::info!("voxsql server listening on {}", config.bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("serve")?;

    Ok(())
}
