use anyhow::Result;
use std::{net::SocketAddr, sync::Arc};
use tariff_client::db::PgTableReader;
use tariff_dashboard::{config::AppConfig, metrics_server, observability, router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let reader = PgTableReader::connect(&cfg.database.uri, cfg.database.max_connections).await?;
    let reader = Arc::new(reader);

    let addr: SocketAddr = cfg
        .server
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;

    let app = router(AppState::new(reader, cfg.settings()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "tariff dashboard listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
