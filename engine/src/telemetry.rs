use axum::{routing::get, Router};
use tokio::net::TcpListener;

use sniper_core::telemetry::gather_text;

async fn metrics() -> String {
    gather_text()
}

pub fn router() -> Router {
    Router::new().route("/metrics", get(metrics))
}

/// Start metrics HTTP server
pub async fn serve_metrics(port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("📊 Prometheus metrics server starting on 0.0.0.0:{}", port);
    axum::serve(listener, router()).await?;
    Ok(())
}
