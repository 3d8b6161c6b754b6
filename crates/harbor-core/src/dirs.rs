//! Directory scaffolding for the Harbor home directory.
//!
//! [`HarborHome`] is the single on-disk root for all runtime state: the
//! server catalog database, installed-server config, secrets, sessions, the
//! local-LLM PID file, and the `harbor.toml` config file. Resolution order
//! is `$HARBOR_HOME` (must be absolute) then `$HOME/.harbor`.
//!
//! # Layout
//!
//! ```text
//! ~/.harbor/
//! ├── logs/                 (daemon log files)
//! ├── sessions/              (one JSON file per chat session)
//! ├── catalog.db              (SQLite — server catalog, resolved-package cache)
//! ├── servers.json             (installed servers + config)
//! ├── secrets.json              (one row per (serverId, key); never logged)
//! ├── harbor.toml                (runtime config)
//! └── local-llm.pid                (pid, modelId, port, startedAt, dockerContainerId?)
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// Global Harbor home directory (`~/.harbor/` or `$HARBOR_HOME`).
#[derive(Debug, Clone)]
pub struct HarborHome {
    root: PathBuf,
}

impl HarborHome {
    /// Resolve the home directory.
    ///
    /// Checks `$HARBOR_HOME` first, then falls back to `$HOME/.harbor/`.
    ///
    /// # Errors
    ///
    /// Returns an error if `$HARBOR_HOME` is set but not absolute, or if
    /// neither `$HARBOR_HOME` nor `$HOME` is set.
    pub fn resolve() -> io::Result<Self> {
        let root = if let Ok(custom) = std::env::var("HARBOR_HOME") {
            let p = PathBuf::from(&custom);
            if !p.is_absolute() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "HARBOR_HOME must be an absolute path",
                ));
            }
            p
        } else {
            let home = std::env::var("HOME").map_err(|_| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "neither HARBOR_HOME nor HOME environment variable is set",
                )
            })?;
            PathBuf::from(home).join(".harbor")
        };

        Ok(Self { root })
    }

    /// Create from an explicit path (useful for testing).
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ensure the directory structure exists with secure permissions.
    ///
    /// Creates `logs/` and `sessions/` and sets the root and both
    /// subdirectories to `0o700` on Unix (owner-only access), since
    /// `secrets.json` and the credential cache live directly under root.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or permission setting fails.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        std::fs::create_dir_all(self.sessions_dir())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(self.root(), perms.clone())?;
            std::fs::set_permissions(self.logs_dir(), perms.clone())?;
            std::fs::set_permissions(self.sessions_dir(), perms)?;
        }
        Ok(())
    }

    /// Root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Logs directory (`~/.harbor/logs/`).
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Sessions directory (`~/.harbor/sessions/`), one JSON file per session.
    #[must_use]
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// Path to the SQLite server catalog / resolved-package cache.
    #[must_use]
    pub fn catalog_db_path(&self) -> PathBuf {
        self.root.join("catalog.db")
    }

    /// Path to the installed-servers JSON file.
    #[must_use]
    pub fn servers_config_path(&self) -> PathBuf {
        self.root.join("servers.json")
    }

    /// Path to the secrets file (one row per `(serverId, key)`).
    #[must_use]
    pub fn secrets_path(&self) -> PathBuf {
        self.root.join("secrets.json")
    }

    /// Path to the `harbor.toml` runtime configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join("harbor.toml")
    }

    /// Path to the PID file for a core-managed local LLM runtime.
    #[must_use]
    pub fn local_llm_pid_path(&self) -> PathBuf {
        self.root.join("local-llm.pid")
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate the `HARBOR_HOME` env var.
    /// `set_var`/`remove_var` are process-wide and unsafe under concurrency.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_harbor_home_resolve_with_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::set_var("HARBOR_HOME", &path) };
        let home = HarborHome::resolve().unwrap();
        assert_eq!(home.root(), path);
        unsafe { std::env::remove_var("HARBOR_HOME") };
    }

    #[test]
    fn test_harbor_home_resolve_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::remove_var("HARBOR_HOME") };
        let home = HarborHome::resolve().unwrap();
        let expected = PathBuf::from(std::env::var("HOME").unwrap()).join(".harbor");
        assert_eq!(home.root(), expected);
    }

    #[test]
    fn test_harbor_home_ensure_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let home = HarborHome::from_path(dir.path());
        home.ensure().unwrap();

        assert!(home.logs_dir().exists());
        assert!(home.sessions_dir().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_harbor_home_ensure_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let home = HarborHome::from_path(dir.path());
        home.ensure().unwrap();

        let root_perms = std::fs::metadata(home.root()).unwrap().permissions();
        assert_eq!(root_perms.mode() & 0o777, 0o700);

        let logs_perms = std::fs::metadata(home.logs_dir()).unwrap().permissions();
        assert_eq!(logs_perms.mode() & 0o777, 0o700);
    }

    #[test]
    fn test_harbor_home_rejects_relative_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::set_var("HARBOR_HOME", "relative/path") };
        let result = HarborHome::resolve();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("absolute"),
            "expected absolute path error, got: {err}"
        );
        unsafe { std::env::remove_var("HARBOR_HOME") };
    }

    #[test]
    fn test_harbor_home_rejects_empty_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::set_var("HARBOR_HOME", "") };
        let result = HarborHome::resolve();
        assert!(result.is_err());
        unsafe { std::env::remove_var("HARBOR_HOME") };
    }

    #[test]
    fn test_harbor_home_path_accessors() {
        let home = HarborHome::from_path("/tmp/test-harbor");
        assert_eq!(home.root(), Path::new("/tmp/test-harbor"));
        assert_eq!(home.logs_dir(), PathBuf::from("/tmp/test-harbor/logs"));
        assert_eq!(
            home.sessions_dir(),
            PathBuf::from("/tmp/test-harbor/sessions")
        );
        assert_eq!(
            home.catalog_db_path(),
            PathBuf::from("/tmp/test-harbor/catalog.db")
        );
        assert_eq!(
            home.servers_config_path(),
            PathBuf::from("/tmp/test-harbor/servers.json")
        );
        assert_eq!(
            home.secrets_path(),
            PathBuf::from("/tmp/test-harbor/secrets.json")
        );
        assert_eq!(
            home.config_path(),
            PathBuf::from("/tmp/test-harbor/harbor.toml")
        );
        assert_eq!(
            home.local_llm_pid_path(),
            PathBuf::from("/tmp/test-harbor/local-llm.pid")
        );
    }
}
