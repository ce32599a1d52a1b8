use anyhow::Context;

use qsadmin_api::config::AppConfig;
use qsadmin_api::context::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Must precede AppConfig::from_env, which logs.
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    qsadmin_observability::init(log_format);

    let config = AppConfig::from_env()?;

    let bind_addr = config.bind_addr;
    let app = AppContext::build(config).await?;
    let router = qsadmin_api::app::build_app(app);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router).await?;
    Ok(())
}
