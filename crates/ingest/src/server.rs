use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;


const OPENMETRICS: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";


async fn get_metrics(Extension(registry): Extension<Arc<Registry>>) -> impl IntoResponse {
    let mut buffer = String::new();
    if let Err(err) = prometheus_client::encoding::text::encode(&mut buffer, &registry) {
        error!(error =? err, "failed to encode metrics");
    }
    ([(CONTENT_TYPE, HeaderValue::from_static(OPENMETRICS))], buffer)
}


pub async fn run_server(
    registry: Registry,
    port: u16,
    cancel: CancellationToken
) -> anyhow::Result<()>
{
    let app = Router::new()
        .route("/metrics", get(get_metrics))
        .layer(Extension(Arc::new(registry)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}
