use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Роутер echo-сервиса: `GET /?delay=<ms>`.
pub fn router() -> Router {
    Router::new().route("/", get(handle_echo))
}

/// Echo HTTP сервер. Останавливается по `shutdown`.
pub async fn run(listener: TcpListener, shutdown: CancellationToken) -> std::io::Result<()> {
    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

/// Identity of the worker thread currently polling the task,
/// e.g. `echo-worker-3@ThreadId(7)`.
pub fn worker_identity() -> String {
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("unnamed");
    format!("{name}@{:?}", thread.id())
}

// --- REST: GET /?delay=<ms> ---

#[derive(Debug, Deserialize)]
struct EchoParams {
    #[serde(default)]
    delay: u64,
}

async fn handle_echo(Query(params): Query<EchoParams>) -> String {
    if params.delay > 0 {
        tokio::time::sleep(Duration::from_millis(params.delay)).await;
    }
    // Поток, который завершил запрос, а не тот, что его принял.
    let identity = worker_identity();
    tracing::debug!(delay_ms = params.delay, worker = %identity, "echo");
    identity
}
