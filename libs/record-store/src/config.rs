use std::path::PathBuf;

/// Выбор storage backend'а для записей.
///
/// ```toml
/// [storage]
/// kind = "file"
/// path = "data/records.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Записи живут до остановки процесса.
    #[default]
    Memory,
    /// Append-only JSONL файл, одна запись на строку.
    File { path: PathBuf },
}

/// On-disk line format for the file backend.
#[derive(serde::Serialize, serde::Deserialize)]
pub(crate) struct DiskRecord {
    pub id: u64,
    pub text: String,
}
