use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clickpesa_relay::{
    build_router, database::connection::connect_store, services::outbox::spawn_outbox_worker,
    AppConfig, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env();
    tracing::info!("🔧 Config: {}", config.get_config_info());

    let missing = config.missing_variables();
    if !missing.is_empty() {
        tracing::warn!("⚠️ Missing configuration: {}", missing.join(", "));
    }

    let store = connect_store(&config).await;
    let app_state = AppState::new(config, store.clone()).context("Failed to initialize services")?;

    spawn_outbox_worker(
        app_state.webhooks.outbox().clone(),
        store,
        Duration::from_secs(app_state.config.outbox_retry_interval_secs.max(1)),
    );

    let addr: SocketAddr = format!("{}:{}", app_state.config.host, app_state.config.port)
        .parse()
        .context("HOST/PORT do not form a valid socket address")?;

    let app = build_router(app_state);

    tracing::info!("🚀 Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
