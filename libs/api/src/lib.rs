use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

mod error;
pub use error::{ErrorKind, StorageError};

// ════════════════════════════════════════════════════════════════
//  Records
// ════════════════════════════════════════════════════════════════

/// Сохранённая запись: идентификатор, выданный storage, и текст.
///
/// `id` строго положительный и никогда не переиспользуется.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub text: String,
}

/// Запись до сохранения: идентификатора ещё нет.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRecord {
    pub text: String,
}

impl NewRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Attach the identifier chosen by the storage backend.
    pub fn with_id(self, id: u64) -> Record {
        Record { id, text: self.text }
    }
}

// ════════════════════════════════════════════════════════════════
//  Storage Trait
// ════════════════════════════════════════════════════════════════

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Storage backend для записей агрегатора.
///
/// Реализации: memory storage, JSONL file storage. Backend сам выдаёт
/// идентификаторы; запись считается durable, когда `save` вернул `Ok`.
pub trait RecordStorage: Send + Sync {
    /// Инициализация (создание директорий, восстановление счётчика id).
    fn init(&self) -> StorageFuture<'_, ()>;

    /// Сохранить новую запись и вернуть её с присвоенным id.
    fn save(&self, record: NewRecord) -> StorageFuture<'_, Record>;

    /// Найти запись по id.
    fn find(&self, id: u64) -> StorageFuture<'_, Option<Record>>;

    /// Flush буферов на диск.
    fn flush(&self) -> StorageFuture<'_, ()>;
}
