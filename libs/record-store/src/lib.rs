//! Storage backends for aggregated records.

mod config;
mod file;
mod memory;

use std::sync::Arc;

use relay_api::{RecordStorage, StorageError};

pub use config::StorageConfig;
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Создать и инициализировать backend по конфигу.
pub async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn RecordStorage>, StorageError> {
    let storage: Arc<dyn RecordStorage> = match config {
        StorageConfig::Memory => Arc::new(MemoryStorage::new()),
        StorageConfig::File { path } => {
            if path.as_os_str().is_empty() {
                return Err(StorageError::config("storage.path must not be empty"));
            }
            Arc::new(FileStorage::new(path.clone()))
        }
    };
    storage.init().await?;
    Ok(storage)
}
