use anyhow::Context;

use echoledger_api::{app, config::ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    echoledger_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let app = app::build_app(&config).context("failed to start ledger services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
