//! Validated hot-reload for `harbor.toml`.
//!
//! A reload can be triggered by `SIGHUP` or by a filesystem change
//! (watched via `notify`). Either path re-parses and re-validates the
//! file before swapping it in; a malformed reload is logged and ignored,
//! never propagated as a crash (§6).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::RwLock;

use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::loader::load_from_path;
use crate::types::HarborConfig;

/// A config value that can be hot-reloaded in place.
///
/// Readers clone the current snapshot out of the lock; the reload loop
/// replaces it wholesale. A failed reload leaves the prior value intact.
#[derive(Clone)]
pub struct ReloadableConfig {
    path: PathBuf,
    current: Arc<RwLock<HarborConfig>>,
}

impl ReloadableConfig {
    /// Load `harbor.toml` from `path` (or defaults if absent) and wrap it
    /// for hot-reload.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::ConfigError`] if the initial load fails.
    pub fn load(path: impl Into<PathBuf>) -> crate::error::ConfigResult<Self> {
        let path = path.into();
        let config = load_from_path(&path)?;
        Ok(Self {
            path,
            current: Arc::new(RwLock::new(config)),
        })
    }

    /// The config path being watched.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A snapshot of the currently active configuration.
    #[must_use]
    pub fn current(&self) -> HarborConfig {
        self.current
            .read()
            .expect("config lock poisoned")
            .clone()
    }

    /// Re-read and validate the file, swapping it in on success.
    ///
    /// On failure the prior configuration remains active; the error is
    /// logged and returned to the caller for observability, not
    /// propagated as a process-fatal condition.
    pub fn reload(&self) -> crate::error::ConfigResult<()> {
        match load_from_path(&self.path) {
            Ok(config) => {
                *self.current.write().expect("config lock poisoned") = config;
                info!(path = %self.path.display(), "harbor.toml reloaded");
                Ok(())
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "harbor.toml reload rejected, keeping prior config");
                Err(e)
            },
        }
    }

    /// Spawn a background task that reloads on `SIGHUP` and on any
    /// filesystem change to the watched file, for the lifetime of the
    /// returned [`tokio::task::JoinHandle`].
    ///
    /// Dropping or aborting the handle stops watching; it does not affect
    /// the already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the `SIGHUP` signal handler or the filesystem
    /// watcher cannot be installed.
    pub fn spawn_watch(self: Arc<Self>) -> std::io::Result<tokio::task::JoinHandle<()>> {
        let mut sighup = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())?;

        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let watch_path = self.path.clone();
        let watch_dir = watch_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                if event.paths.iter().any(|p| p == &watch_path) {
                    let _ = tx.send(());
                }
            }
        })
        .map_err(|e| std::io::Error::other(e.to_string()))?;
        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        let this = self.clone();
        Ok(tokio::spawn(async move {
            // Keep the watcher alive for the task's lifetime.
            let _watcher = watcher;
            loop {
                tokio::select! {
                    _ = sighup.recv() => {
                        info!("received SIGHUP, reloading harbor.toml");
                    },
                    Some(()) = rx.recv() => {
                        info!("detected harbor.toml change, reloading");
                    },
                    else => break,
                }
                if let Err(e) = this.reload() {
                    error!(error = %e, "harbor.toml reload failed, continuing with prior config");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reload_picks_up_valid_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harbor.toml");
        std::fs::write(&path, "[runtime]\ndefault_iteration_bound = 5\n").unwrap();

        let reloadable = ReloadableConfig::load(&path).unwrap();
        assert_eq!(reloadable.current().runtime.default_iteration_bound, 5);

        std::fs::write(&path, "[runtime]\ndefault_iteration_bound = 9\n").unwrap();
        reloadable.reload().unwrap();
        assert_eq!(reloadable.current().runtime.default_iteration_bound, 9);
    }

    #[tokio::test]
    async fn reload_rejects_invalid_changes_and_keeps_prior_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harbor.toml");
        std::fs::write(&path, "[runtime]\ndefault_iteration_bound = 5\n").unwrap();

        let reloadable = ReloadableConfig::load(&path).unwrap();
        std::fs::write(&path, "[runtime]\ndefault_iteration_bound = 0\n").unwrap();

        assert!(reloadable.reload().is_err());
        assert_eq!(reloadable.current().runtime.default_iteration_bound, 5);
    }
}
