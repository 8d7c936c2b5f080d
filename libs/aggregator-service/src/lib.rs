mod client;
mod error;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use relay_api::{NewRecord, Record, RecordStorage};

pub use client::{EchoClient, EchoSource};
pub use error::{AggregateError, UpstreamError};

/// Зависимости агрегатора, передаются явно при старте.
#[derive(Clone)]
pub struct AggregatorState {
    echo: Arc<dyn EchoSource>,
    storage: Arc<dyn RecordStorage>,
}

impl AggregatorState {
    pub fn new(echo: Arc<dyn EchoSource>, storage: Arc<dyn RecordStorage>) -> Self {
        Self { echo, storage }
    }

    /// Два вызова echo, конкатенация в порядке вызова, сохранение.
    ///
    /// Nothing is persisted unless both upstream calls succeed and the
    /// concatenated text is non-empty.
    pub async fn aggregate(&self, delay: u64) -> Result<Record, AggregateError> {
        // try_join! возвращает результаты в порядке аргументов,
        // независимо от того, какой ответ пришёл первым.
        let (first, second) = tokio::try_join!(self.echo.get_text(delay), self.echo.get_text(delay))?;

        let mut text = first;
        text.push_str(&second);
        if text.is_empty() {
            return Err(AggregateError::EmptyText);
        }

        let record = self.storage.save(NewRecord::new(text)).await?;
        Ok(record)
    }
}

/// Роутер агрегатора: `GET /?delay=<ms>`.
pub fn router(state: AggregatorState) -> Router {
    Router::new()
        .route("/", get(handle_aggregate))
        .with_state(state)
}

/// Aggregator HTTP server. Stops accepting on `shutdown` and drains
/// in-flight requests.
pub async fn run(
    listener: TcpListener,
    state: AggregatorState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

// --- REST: GET /?delay=<ms> ---

#[derive(Debug, Deserialize)]
struct AggregateParams {
    delay: u64,
}

async fn handle_aggregate(
    State(state): State<AggregatorState>,
    Query(params): Query<AggregateParams>,
) -> Result<Json<Record>, AggregateError> {
    match state.aggregate(params.delay).await {
        Ok(record) => {
            tracing::info!(delay_ms = params.delay, id = record.id, "record saved");
            Ok(Json(record))
        }
        Err(AggregateError::Storage(e)) if e.kind().is_fatal() => {
            tracing::error!(delay_ms = params.delay, error = %e, "storage unusable");
            Err(AggregateError::Storage(e))
        }
        Err(e) => {
            tracing::warn!(delay_ms = params.delay, error = %e, "aggregate failed");
            Err(e)
        }
    }
}
