//! Audit storage backends.

use crate::entry::AuditEntry;
use crate::error::AuditError;
use crate::logger::AuditFilter;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// Trait for audit storage backends.
///
/// `store` must write the entry atomically: concurrent callers may never
/// produce an interleaved or partial record.
pub trait AuditStorage: Send + Sync {
    /// Store an audit entry.
    fn store(&self, entry: &AuditEntry) -> Result<(), AuditError>;

    /// Query stored entries. Backends that cannot read back return nothing.
    fn query(&self, _filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(Vec::new())
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullStorage;

impl NullStorage {
    pub fn new() -> Self {
        Self
    }
}

impl AuditStorage for NullStorage {
    fn store(&self, _entry: &AuditEntry) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Emits entries through `tracing` under the `warden::audit` target.
#[derive(Debug, Default)]
pub struct ConsoleStorage;

impl ConsoleStorage {
    pub fn new() -> Self {
        Self
    }
}

impl AuditStorage for ConsoleStorage {
    fn store(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        tracing::info!(target: "warden::audit", "{}", entry.to_log_line());
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
pub struct JsonLinesStorage {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesStorage {
    /// Open (or create) the log file, creating parent directories as needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                AuditError::InitializationFailed(format!("{}: {}", path.display(), e))
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditStorage for JsonLinesStorage {
    fn store(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = self
            .file
            .lock()
            .map_err(|e| AuditError::StorageError(format!("audit file lock poisoned: {}", e)))?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError> {
        // Hold the write lock so a concurrent append is never read half-written.
        let _guard = self
            .file
            .lock()
            .map_err(|e| AuditError::StorageError(format!("audit file lock poisoned: {}", e)))?;

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable audit line"),
            }
        }
        Ok(filter.apply(entries))
    }
}

/// Keeps entries in memory. Intended for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, in insertion order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditStorage for MemoryStorage {
    fn store(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| AuditError::StorageError(format!("Failed to acquire write lock: {}", e)))?;
        entries.push(entry.clone());
        Ok(())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| AuditError::StorageError(format!("Failed to acquire read lock: {}", e)))?;
        Ok(filter.apply(entries.clone()))
    }
}

/// File plus console output. Queries read from the file.
pub struct DualStorage {
    file: JsonLinesStorage,
    console: ConsoleStorage,
}

impl DualStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        Ok(Self {
            file: JsonLinesStorage::new(path)?,
            console: ConsoleStorage,
        })
    }
}

impl AuditStorage for DualStorage {
    fn store(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        self.console.store(entry)?;
        self.file.store(entry)
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, AuditError> {
        self.file.query(filter)
    }
}
