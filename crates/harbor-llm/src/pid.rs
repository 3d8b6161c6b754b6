//! Local-model PID-file lifecycle (§4.4, §6).
//!
//! A core-managed local LLM runtime (e.g. a `llama.cpp`/Ollama process
//! Harbor itself spawned) records its liveness in
//! `HarborHome::local_llm_pid_path()`. On startup Harbor must decide
//! whether a recorded pid is still *that* process before re-adopting it —
//! pids get reused by the OS, so liveness alone (`kill(pid, 0)`) is not
//! enough; the recovered process's command line is also checked.

use std::path::PathBuf;

use harbor_core::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while managing the local-model PID file.
#[derive(Debug, Error)]
pub enum PidError {
    /// The PID file could not be read or written.
    #[error("pid file io error: {0}")]
    Io(#[from] std::io::Error),
    /// The PID file content was not valid JSON.
    #[error("malformed pid file: {0}")]
    Malformed(String),
}

impl PidError {
    /// The wire error code this variant converts to (§7).
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) | Self::Malformed(_) => ErrorCode::Internal,
        }
    }
}

/// Result type for PID-file operations.
pub type PidResult<T> = Result<T, PidError>;

/// Record persisted to `local-llm.pid` while a core-managed local model
/// runtime is running.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalModelRecord {
    /// OS pid of the model runtime process.
    pub pid: u32,
    /// The model identifier that was loaded.
    pub model_id: String,
    /// Port the runtime is listening on.
    pub port: u16,
    /// When the runtime was started (RFC 3339).
    pub started_at: String,
    /// Docker container id, if the runtime was started inside a container.
    pub docker_container_id: Option<String>,
}

/// Decides whether an OS pid still refers to the process that wrote it,
/// distinguishing a live local-model runtime from an unrelated process
/// that has since reused the same pid (Design Note: "process-reuse
/// detection").
///
/// Implemented as a trait so tests can fake process state without
/// spawning anything.
pub trait ProcessReuseCheck: Send + Sync {
    /// Whether a process with this pid currently exists.
    fn is_alive(&self, pid: u32) -> bool;

    /// The command line of the process with this pid, if it could be
    /// read. `None` if the process is gone or the command line is
    /// unavailable on this platform.
    fn cmdline(&self, pid: u32) -> Option<String>;
}

/// [`ProcessReuseCheck`] backed by real OS facilities: `kill(pid, 0)` for
/// liveness and `/proc/<pid>/cmdline` for the command line (Linux only;
/// other platforms always report no command line, so re-adoption falls
/// back to liveness alone there).
#[derive(Debug, Default, Clone, Copy)]
pub struct OsProcessReuseCheck;

impl ProcessReuseCheck for OsProcessReuseCheck {
    #[cfg(unix)]
    fn is_alive(&self, pid: u32) -> bool {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        // Signal 0: no signal sent, only existence/permission checked.
        kill(Pid::from_raw(pid as i32), None).is_ok()
    }

    #[cfg(not(unix))]
    fn is_alive(&self, _pid: u32) -> bool {
        false
    }

    fn cmdline(&self, pid: u32) -> Option<String> {
        let path = format!("/proc/{pid}/cmdline");
        let raw = std::fs::read(path).ok()?;
        Some(
            raw.split(|b| *b == 0)
                .filter(|part| !part.is_empty())
                .map(|part| String::from_utf8_lossy(part).into_owned())
                .collect::<Vec<_>>()
                .join(" "),
        )
    }
}

/// Manages the lifecycle of `local-llm.pid`.
pub struct LocalModelPidFile {
    path: PathBuf,
}

impl LocalModelPidFile {
    /// Create a handle for the pid file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write a fresh record, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    pub fn write(&self, record: &LocalModelRecord) -> PidResult<()> {
        let content = serde_json::to_vec_pretty(record)
            .map_err(|e| PidError::Malformed(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Remove the pid file, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails for a reason other than the file
    /// already being absent.
    pub fn remove(&self) -> PidResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the current record, if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read(&self) -> PidResult<Option<LocalModelRecord>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let record = serde_json::from_str(&content)
                    .map_err(|e| PidError::Malformed(e.to_string()))?;
                Ok(Some(record))
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Attempt to re-adopt the process recorded in this pid file.
    ///
    /// Returns `Some(record)` only if the pid is both alive and its
    /// command line still contains the recorded model id (a weak but
    /// cheap signal that this is the same process, not one that reused
    /// the pid after the original exited). Returns `None` (and, for a
    /// dead or reused pid, removes the stale file) otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, or if
    /// removing a stale file fails.
    pub fn try_reclaim(&self, checker: &dyn ProcessReuseCheck) -> PidResult<Option<LocalModelRecord>> {
        let Some(record) = self.read()? else {
            return Ok(None);
        };

        if !checker.is_alive(record.pid) {
            self.remove()?;
            return Ok(None);
        }

        match checker.cmdline(record.pid) {
            Some(cmdline) if cmdline.contains(&record.model_id) => Ok(Some(record)),
            Some(_) => {
                // pid reused by an unrelated process.
                self.remove()?;
                Ok(None)
            },
            // Command line unavailable (non-Linux): fall back to liveness
            // alone, accepting the weaker guarantee.
            None => Ok(Some(record)),
        }
    }
}

/// Convenience: path under a [`harbor_core::HarborHome`].
#[must_use]
pub fn default_pid_path(home: &harbor_core::HarborHome) -> PathBuf {
    home.local_llm_pid_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProcesses {
        alive: Mutex<HashMap<u32, String>>,
    }

    impl FakeProcesses {
        fn with(pid: u32, cmdline: &str) -> Self {
            let mut map = HashMap::new();
            map.insert(pid, cmdline.to_string());
            Self {
                alive: Mutex::new(map),
            }
        }
    }

    impl ProcessReuseCheck for FakeProcesses {
        fn is_alive(&self, pid: u32) -> bool {
            self.alive.lock().unwrap().contains_key(&pid)
        }

        fn cmdline(&self, pid: u32) -> Option<String> {
            self.alive.lock().unwrap().get(&pid).cloned()
        }
    }

    fn record() -> LocalModelRecord {
        LocalModelRecord {
            pid: 4242,
            model_id: "llama-3.1-8b".to_string(),
            port: 8089,
            started_at: "2026-01-01T00:00:00Z".to_string(),
            docker_container_id: None,
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = LocalModelPidFile::new(dir.path().join("local-llm.pid"));
        pid_file.write(&record()).unwrap();
        assert_eq!(pid_file.read().unwrap(), Some(record()));
    }

    #[test]
    fn reclaim_succeeds_when_pid_alive_and_cmdline_matches() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = LocalModelPidFile::new(dir.path().join("local-llm.pid"));
        pid_file.write(&record()).unwrap();

        let checker = FakeProcesses::with(4242, "/usr/bin/llama-server --model llama-3.1-8b");
        let reclaimed = pid_file.try_reclaim(&checker).unwrap();
        assert_eq!(reclaimed, Some(record()));
    }

    #[test]
    fn reclaim_rejects_reused_pid_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = LocalModelPidFile::new(dir.path().join("local-llm.pid"));
        pid_file.write(&record()).unwrap();

        let checker = FakeProcesses::with(4242, "/usr/bin/some-unrelated-daemon");
        let reclaimed = pid_file.try_reclaim(&checker).unwrap();
        assert_eq!(reclaimed, None);
        assert_eq!(pid_file.read().unwrap(), None);
    }

    #[test]
    fn reclaim_returns_none_when_pid_is_dead() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = LocalModelPidFile::new(dir.path().join("local-llm.pid"));
        pid_file.write(&record()).unwrap();

        let checker = FakeProcesses::default();
        let reclaimed = pid_file.try_reclaim(&checker).unwrap();
        assert_eq!(reclaimed, None);
    }

    #[test]
    fn missing_file_reclaims_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = LocalModelPidFile::new(dir.path().join("local-llm.pid"));
        let checker = FakeProcesses::default();
        assert_eq!(pid_file.try_reclaim(&checker).unwrap(), None);
    }
}
