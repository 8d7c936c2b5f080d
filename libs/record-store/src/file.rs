use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use relay_api::{NewRecord, Record, RecordStorage, StorageError, StorageFuture};

use crate::config::DiskRecord;

// ════════════════════════════════════════════════════════════════
//  FileStorage
// ════════════════════════════════════════════════════════════════

/// Append-only JSONL storage: `{"id":1,"text":"..."}` на строку.
///
/// `init` сканирует существующий файл и продолжает нумерацию после
/// максимального id, так что после рестарта id не переиспользуются.
pub struct FileStorage {
    path: PathBuf,
    /// Следующий id. `None` до вызова `init`.
    next_id: Mutex<Option<u64>>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_id: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Создать родительскую директорию и найти максимальный id в файле.
    fn open_existing(&self) -> Result<u64, StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::io(format_args!("mkdir {}", parent.display()), e))?;
            }
        }
        self.scan_max_id()
    }

    fn append_next(&self, next_id: &mut Option<u64>, record: NewRecord) -> Result<Record, StorageError> {
        let id = next_id.ok_or_else(|| StorageError::not_ready("file storage used before init"))?;
        // id расходуется даже при ошибке записи: повторно он не выдаётся.
        *next_id = Some(id + 1);
        let record = record.with_id(id);
        self.append_line(&record)?;
        Ok(record)
    }

    fn scan_max_id(&self) -> Result<u64, StorageError> {
        let Some(f) = self.open_for_read()? else {
            return Ok(0);
        };

        let mut max_id = 0;
        for (lineno, line) in std::io::BufReader::new(f).lines().enumerate() {
            let line = line.map_err(|e| StorageError::io("read line", e))?;
            if line.is_empty() {
                continue;
            }
            let record = parse_line(&line).map_err(|e| {
                StorageError::corrupt(format!("{}:{}: {e}", self.path.display(), lineno + 1))
            })?;
            max_id = max_id.max(record.id);
        }
        Ok(max_id)
    }

    fn append_line(&self, record: &Record) -> Result<(), StorageError> {
        let line = serde_json::to_string(&DiskRecord {
            id: record.id,
            text: record.text.clone(),
        })
        .map_err(|e| StorageError::corrupt(format!("json serialize: {e}")))?;

        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::io(format_args!("open {}", self.path.display()), e))?;
        append_synced(&mut f, &line)
    }

    /// `None`, если файла ещё нет.
    fn open_for_read(&self) -> Result<Option<std::fs::File>, StorageError> {
        match std::fs::File::open(&self.path) {
            Ok(f) => Ok(Some(f)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(format_args!("open {}", self.path.display()), e)),
        }
    }

    fn do_find(&self, id: u64) -> Result<Option<Record>, StorageError> {
        let Some(f) = self.open_for_read()? else {
            return Ok(None);
        };

        for line in std::io::BufReader::new(f).lines() {
            let line = line.map_err(|e| StorageError::io("read line", e))?;
            if line.is_empty() {
                continue;
            }
            let record = parse_line(&line)?;
            if record.id == id {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

fn parse_line(line: &str) -> Result<Record, StorageError> {
    let dr: DiskRecord = serde_json::from_str(line)
        .map_err(|e| StorageError::corrupt(format!("parse json: {e}")))?;
    Ok(Record { id: dr.id, text: dr.text })
}

// --- append with rollback ---

/// Файл журнала, в конец которого дописываются строки.
trait Journal: Write {
    fn end_offset(&self) -> std::io::Result<u64>;
    fn sync(&self) -> std::io::Result<()>;
    fn truncate(&mut self, len: u64) -> std::io::Result<()>;
}

impl Journal for std::fs::File {
    fn end_offset(&self) -> std::io::Result<u64> {
        self.metadata().map(|m| m.len())
    }

    fn sync(&self) -> std::io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }
}

/// Дописать строку и дождаться fsync. При любой ошибке файл обрезается
/// до исходной длины: ни оборванной строки, ни неподтверждённой записи.
fn append_synced<J: Journal>(journal: &mut J, line: &str) -> Result<(), StorageError> {
    let start = journal
        .end_offset()
        .map_err(|e| StorageError::io("stat", e))?;

    let written = writeln!(journal, "{line}")
        .map_err(|e| StorageError::io("write", e))
        .and_then(|()| journal.sync().map_err(|e| StorageError::io("sync", e)));

    if written.is_err() {
        if let Err(e) = journal.truncate(start) {
            tracing::error!(error = %e, offset = start, "rollback of failed append");
        }
    }
    written
}

// ════════════════════════════════════════════════════════════════
//  RecordStorage impl
// ════════════════════════════════════════════════════════════════

impl RecordStorage for FileStorage {
    fn init(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            let mut next_id = self.next_id.lock().await;
            self.open_existing().map(|max_id| {
                *next_id = Some(max_id + 1);
                tracing::info!(path = %self.path.display(), next_id = max_id + 1, "file storage ready");
            })
        })
    }

    fn save(&self, record: NewRecord) -> StorageFuture<'_, Record> {
        Box::pin(async move {
            // Lock держится до конца записи: id и порядок строк совпадают.
            let mut next_id = self.next_id.lock().await;
            self.append_next(&mut next_id, record)
        })
    }

    fn find(&self, id: u64) -> StorageFuture<'_, Option<Record>> {
        Box::pin(async move {
            let _guard = self.next_id.lock().await;
            self.do_find(id)
        })
    }

    fn flush(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            let _guard = self.next_id.lock().await;
            self.open_for_read().and_then(|f| match f {
                Some(f) => f.sync_all().map_err(|e| StorageError::io("sync", e)),
                None => Ok(()),
            })
        })
    }
}
