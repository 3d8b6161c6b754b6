//! Session persistence: one JSON file per session under a sessions
//! directory (§6), following the same load/save idiom
//! `harbor-mcp::config::ServersConfig` uses for its on-disk state.

use std::path::{Path, PathBuf};

use harbor_core::{HarborHome, SessionId, Timestamp};

use crate::error::{RuntimeError, RuntimeResult};
use crate::session::ChatSession;

/// Lightweight session metadata for listing without loading full
/// transcripts (§4.6 `listSessions`-style operations).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionSummary {
    /// Session id.
    pub id: SessionId,
    /// Number of messages in the transcript.
    pub message_count: usize,
    /// Enabled server ids.
    pub enabled_servers: Vec<String>,
    /// When the session was created.
    pub created_at: Timestamp,
    /// When the session was last modified.
    pub updated_at: Timestamp,
}

impl From<&ChatSession> for SessionSummary {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id,
            message_count: session.messages.len(),
            enabled_servers: session.enabled_servers.iter().cloned().collect(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Reads and writes [`ChatSession`]s to a directory, one JSON file per
/// session named by its id.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Use the sessions directory under a [`HarborHome`].
    #[must_use]
    pub fn from_home(home: &HarborHome) -> Self {
        Self {
            root: home.sessions_dir(),
        }
    }

    /// Use an arbitrary directory (tests, alternate layouts).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, id: SessionId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    /// Persist a session, overwriting any prior file for the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, session: &ChatSession) -> RuntimeResult<()> {
        std::fs::create_dir_all(&self.root)?;
        let content = serde_json::to_vec_pretty(session)
            .map_err(|e| RuntimeError::SerializationError(e.to_string()))?;
        std::fs::write(self.path_for(session.id), content)?;
        Ok(())
    }

    /// Load a session by id.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::SessionNotFound`] if no file exists for
    /// `id`, or a serialization error if the file is malformed.
    pub fn load(&self, id: SessionId) -> RuntimeResult<ChatSession> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(RuntimeError::SessionNotFound {
                session_id: id.to_string(),
            });
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| RuntimeError::SerializationError(e.to_string()))
    }

    /// Delete a session's file, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete(&self, id: SessionId) -> RuntimeResult<()> {
        let path = self.path_for(id);
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// List summaries for every persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn list(&self) -> RuntimeResult<Vec<SessionSummary>> {
        if !Path::new(&self.root).exists() {
            return Ok(Vec::new());
        }
        let mut summaries = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let session: ChatSession = serde_json::from_str(&content)
                .map_err(|e| RuntimeError::SerializationError(e.to_string()))?;
            summaries.push(SessionSummary::from(&session));
        }
        summaries.sort_by_key(|s| std::cmp::Reverse(s.updated_at));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = ChatSession::new();
        let id = session.id;

        store.save(&session).unwrap();
        let loaded = store.load(id).unwrap();

        assert_eq!(loaded.id, id);
    }

    #[test]
    fn load_missing_session_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load(SessionId::new()).is_err());
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let session = ChatSession::new();
        store.save(&session).unwrap();

        store.delete(session.id).unwrap();
        store.delete(session.id).unwrap();

        assert!(store.load(session.id).is_err());
    }

    #[test]
    fn list_returns_summaries_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let mut older = ChatSession::new();
        older.updated_at = Timestamp::from_datetime(
            older.updated_at.as_datetime() - chrono::Duration::seconds(60),
        );
        store.save(&older).unwrap();

        let newer = ChatSession::new();
        store.save(&newer).unwrap();

        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, newer.id);
    }
}
