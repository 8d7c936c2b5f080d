use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use relay_api::StorageError;

/// Failure of an outbound call to the echo service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("invalid echo url '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },

    #[error("build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("upstream: {0}")]
    Upstream(#[from] UpstreamError),

    /// Оба ответа пустые: сохранять нечего.
    #[error("upstream: echo returned no text")]
    EmptyText,

    #[error("storage: {0}")]
    Storage(#[from] StorageError),
}

impl AggregateError {
    pub fn status(&self) -> StatusCode {
        match self {
            AggregateError::Upstream(_) | AggregateError::EmptyText => StatusCode::BAD_GATEWAY,
            AggregateError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AggregateError {
    fn into_response(self) -> Response {
        (self.status(), format!("error: {self}")).into_response()
    }
}
