use relay_api::{ErrorKind, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("storage: {0}")]
    Storage(#[source] StorageError),

    #[error("{0}")]
    Upstream(#[from] aggregator_service::UpstreamError),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),

    #[error("server stopped: {0}")]
    Serve(#[source] std::io::Error),

    #[error("server task: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Неверная настройка storage отчитывается как ошибка конфига,
/// остальное как отказ storage.
impl From<StorageError> for ServerError {
    fn from(e: StorageError) -> Self {
        match e.kind() {
            ErrorKind::Config => ServerError::Config { context: "storage", detail: e.to_string() },
            _ => ServerError::Storage(e),
        }
    }
}
