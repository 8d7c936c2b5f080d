use tokio::sync::RwLock;

use relay_api::{NewRecord, Record, RecordStorage, StorageFuture};

// ═══════════════════════════════════════════════════════════════
//  MemoryStorage
// ═══════════════════════════════════════════════════════════════

/// In-memory storage. Для тестов и запусков, не требующих
/// дисковой persistence.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<Vec<Record>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records saved so far.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl RecordStorage for MemoryStorage {
    fn init(&self) -> StorageFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn save(&self, record: NewRecord) -> StorageFuture<'_, Record> {
        Box::pin(async move {
            // id выдаётся под write lock: параллельные save не пересекаются.
            let mut buf = self.records.write().await;
            let id = buf.last().map_or(1, |last| last.id + 1);
            let record = record.with_id(id);
            buf.push(record.clone());
            Ok(record)
        })
    }

    fn find(&self, id: u64) -> StorageFuture<'_, Option<Record>> {
        Box::pin(async move {
            let buf = self.records.read().await;
            Ok(buf.iter().find(|r| r.id == id).cloned())
        })
    }

    fn flush(&self) -> StorageFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}
