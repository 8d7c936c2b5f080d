use std::fmt;

/// Почему storage не смог выполнить операцию.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Backend сконфигурирован неверно (например, пустой путь).
    Config,
    /// `save`/`find` вызваны до успешного `init`.
    NotReady,
    /// Диск или файловая система отказали; запись не подтверждена.
    Io,
    /// Сохранённые данные не читаются.
    Corrupt,
}

impl ErrorKind {
    /// Повтор запроса не поможет: нужен оператор.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::Config | ErrorKind::Corrupt)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Config => "config",
            ErrorKind::NotReady => "not ready",
            ErrorKind::Io => "io",
            ErrorKind::Corrupt => "corrupt",
        })
    }
}

/// Error returned by every `RecordStorage` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    kind: ErrorKind,
    message: String,
}

impl StorageError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::NotReady, message: msg.into() }
    }

    /// I/O failure while doing `action` (`"open records.jsonl"`, `"sync"`).
    pub fn io(action: impl fmt::Display, source: std::io::Error) -> Self {
        Self { kind: ErrorKind::Io, message: format!("{action}: {source}") }
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Corrupt, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl std::error::Error for StorageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_action() {
        let e = StorageError::io("sync", std::io::Error::other("disk gone"));
        assert_eq!(e.kind(), ErrorKind::Io);
        assert_eq!(e.to_string(), "io error: sync: disk gone");
    }

    #[test]
    fn only_config_and_corrupt_are_fatal() {
        assert!(StorageError::config("empty path").kind().is_fatal());
        assert!(StorageError::corrupt("line 2").kind().is_fatal());
        assert!(!StorageError::not_ready("init first").kind().is_fatal());
        assert!(!StorageError::io("write", std::io::Error::other("full")).kind().is_fatal());
    }
}
