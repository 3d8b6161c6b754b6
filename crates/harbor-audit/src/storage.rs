//! Audit log storage trait and implementations.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use harbor_core::SessionId;

use crate::entry::{AuditEntry, AuditEntryId};
use crate::error::{AuditError, AuditResult};

/// Storage backend for audit logs.
///
/// Implementations must be thread-safe and support storing and
/// retrieving individual entries, session-scoped queries, and chain-head
/// tracking (the latest entry per session, used as the `previous_hash`
/// seed for the next entry).
pub trait AuditStorage: Send + Sync {
    /// Store an audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    fn store(&self, entry: &AuditEntry) -> AuditResult<()>;

    /// Get an entry by id.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn get(&self, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>>;

    /// Get the chain head (latest entry id) for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn get_chain_head(&self, session_id: &SessionId) -> AuditResult<Option<AuditEntryId>>;

    /// Get all entries for a session, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn get_session_entries(&self, session_id: &SessionId) -> AuditResult<Vec<AuditEntry>>;

    /// Get entries whose timestamp falls within `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn get_entries_in_range(
        &self,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> AuditResult<Vec<AuditEntry>>;

    /// Count total entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    fn count(&self) -> AuditResult<usize>;

    /// Count entries for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn count_session(&self, session_id: &SessionId) -> AuditResult<usize>;

    /// List all session ids that have at least one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval fails.
    fn list_sessions(&self) -> AuditResult<Vec<SessionId>>;

    /// Flush pending writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to flush.
    fn flush(&self) -> AuditResult<()>;
}

#[derive(Default)]
struct Index {
    entries: HashMap<AuditEntryId, AuditEntry>,
    session_order: HashMap<SessionId, Vec<AuditEntryId>>,
}

impl Index {
    fn insert(&mut self, entry: AuditEntry) {
        self.session_order
            .entry(entry.session_id)
            .or_default()
            .push(entry.id);
        self.entries.insert(entry.id, entry);
    }
}

/// In-memory audit storage. Entries do not survive process restart; used
/// for tests and for hosts that opt out of durable audit persistence.
#[derive(Debug, Default)]
pub struct MemoryAuditStorage {
    index: Mutex<Index>,
}

impl MemoryAuditStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStorage for MemoryAuditStorage {
    fn store(&self, entry: &AuditEntry) -> AuditResult<()> {
        self.index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .insert(entry.clone());
        Ok(())
    }

    fn get(&self, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .entries
            .get(id)
            .cloned())
    }

    fn get_chain_head(&self, session_id: &SessionId) -> AuditResult<Option<AuditEntryId>> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .session_order
            .get(session_id)
            .and_then(|ids| ids.last().copied()))
    }

    fn get_session_entries(&self, session_id: &SessionId) -> AuditResult<Vec<AuditEntry>> {
        let index = self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?;
        Ok(index
            .session_order
            .get(session_id)
            .into_iter()
            .flatten()
            .filter_map(|id| index.entries.get(id).cloned())
            .collect())
    }

    fn get_entries_in_range(
        &self,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> AuditResult<Vec<AuditEntry>> {
        let index = self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?;
        let mut entries: Vec<AuditEntry> = index
            .entries
            .values()
            .filter(|e| {
                let ts = e.timestamp.as_datetime();
                ts >= start && ts <= end
            })
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    fn count(&self) -> AuditResult<usize> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .entries
            .len())
    }

    fn count_session(&self, session_id: &SessionId) -> AuditResult<usize> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .session_order
            .get(session_id)
            .map_or(0, Vec::len))
    }

    fn list_sessions(&self) -> AuditResult<Vec<SessionId>> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .session_order
            .keys()
            .copied()
            .collect())
    }

    fn flush(&self) -> AuditResult<()> {
        Ok(())
    }
}

/// Append-only JSON-lines audit storage. Every call to [`store`](Self::store)
/// appends one line and fsyncs; the in-memory index is rebuilt by
/// replaying the file on [`open`](Self::open), so reads never touch disk.
pub struct FileAuditStorage {
    path: PathBuf,
    file: Mutex<File>,
    index: Mutex<Index>,
}

impl FileAuditStorage {
    /// Open (or create) a JSON-lines audit log at `path`, replaying any
    /// existing entries into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or an existing line
    /// fails to parse.
    pub fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AuditError::StorageError(e.to_string()))?;
        }

        let mut index = Index::default();
        if path.exists() {
            let reader = BufReader::new(
                File::open(&path).map_err(|e| AuditError::StorageError(e.to_string()))?,
            );
            for line in reader.lines() {
                let line = line.map_err(|e| AuditError::StorageError(e.to_string()))?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: AuditEntry = serde_json::from_str(&line)
                    .map_err(|e| AuditError::SerializationError(e.to_string()))?;
                index.insert(entry);
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AuditError::StorageError(e.to_string()))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
            index: Mutex::new(index),
        })
    }

    /// Path this log was opened at.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditStorage for FileAuditStorage {
    fn store(&self, entry: &AuditEntry) -> AuditResult<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| AuditError::SerializationError(e.to_string()))?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?;
        writeln!(file, "{line}").map_err(|e| AuditError::StorageError(e.to_string()))?;
        file.flush()
            .map_err(|e| AuditError::StorageError(e.to_string()))?;
        drop(file);

        self.index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .insert(entry.clone());
        Ok(())
    }

    fn get(&self, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .entries
            .get(id)
            .cloned())
    }

    fn get_chain_head(&self, session_id: &SessionId) -> AuditResult<Option<AuditEntryId>> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .session_order
            .get(session_id)
            .and_then(|ids| ids.last().copied()))
    }

    fn get_session_entries(&self, session_id: &SessionId) -> AuditResult<Vec<AuditEntry>> {
        let index = self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?;
        Ok(index
            .session_order
            .get(session_id)
            .into_iter()
            .flatten()
            .filter_map(|id| index.entries.get(id).cloned())
            .collect())
    }

    fn get_entries_in_range(
        &self,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> AuditResult<Vec<AuditEntry>> {
        let index = self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?;
        let mut entries: Vec<AuditEntry> = index
            .entries
            .values()
            .filter(|e| {
                let ts = e.timestamp.as_datetime();
                ts >= start && ts <= end
            })
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    fn count(&self) -> AuditResult<usize> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .entries
            .len())
    }

    fn count_session(&self, session_id: &SessionId) -> AuditResult<usize> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .session_order
            .get(session_id)
            .map_or(0, Vec::len))
    }

    fn list_sessions(&self) -> AuditResult<Vec<SessionId>> {
        Ok(self
            .index
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .session_order
            .keys()
            .copied()
            .collect())
    }

    fn flush(&self) -> AuditResult<()> {
        self.file
            .lock()
            .map_err(|_| AuditError::StorageError("lock poisoned".to_string()))?
            .sync_all()
            .map_err(|e| AuditError::StorageError(e.to_string()))
    }
}

impl std::fmt::Debug for FileAuditStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAuditStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{AuditAction, AuditOutcome, AuthorizationProof};
    use harbor_crypto::ContentHash;

    #[test]
    fn memory_store_and_retrieve() {
        let storage = MemoryAuditStorage::new();
        let session_id = SessionId::new();

        let entry = AuditEntry::new(
            session_id,
            AuditAction::ConfigReloaded,
            AuthorizationProof::System {
                reason: "test".to_string(),
            },
            AuditOutcome::success(),
            ContentHash::zero(),
        );
        let entry_id = entry.id;

        storage.store(&entry).unwrap();
        assert_eq!(storage.get(&entry_id).unwrap().unwrap().id, entry_id);
        assert_eq!(storage.get_chain_head(&session_id).unwrap(), Some(entry_id));
    }

    #[test]
    fn session_entries_preserve_insertion_order() {
        let storage = MemoryAuditStorage::new();
        let session_id = SessionId::new();

        let mut prev_hash = ContentHash::zero();
        for i in 0..3 {
            let entry = AuditEntry::new(
                session_id,
                AuditAction::McpToolCall {
                    server: "test".to_string(),
                    tool: format!("tool_{i}"),
                    args_hash: ContentHash::zero(),
                    run_id: None,
                },
                AuthorizationProof::NotRequired {
                    reason: "test".to_string(),
                },
                AuditOutcome::success(),
                prev_hash,
            );
            prev_hash = entry.content_hash();
            storage.store(&entry).unwrap();
        }

        let entries = storage.get_session_entries(&session_id).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(storage.count_session(&session_id).unwrap(), 3);
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let session_id = SessionId::new();

        {
            let storage = FileAuditStorage::open(&path).unwrap();
            let entry = AuditEntry::new(
                session_id,
                AuditAction::ConfigReloaded,
                AuthorizationProof::System {
                    reason: "startup".to_string(),
                },
                AuditOutcome::success(),
                ContentHash::zero(),
            );
            storage.store(&entry).unwrap();
        }

        let reopened = FileAuditStorage::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(reopened.get_session_entries(&session_id).unwrap().len(), 1);
    }
}
