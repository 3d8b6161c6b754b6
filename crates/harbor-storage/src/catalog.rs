//! SQLite-backed server catalog and resolved-package cache (§6).
//!
//! The catalog is a cache of what a package resolver (external to this
//! core, per spec §1's Out-of-scope list) has already resolved: given a
//! server id and a version constraint, what concrete package manifest
//! and install command did we last resolve it to. The core never talks
//! to a registry itself — it reads and writes this table as a
//! resolver-facing cache, keyed for quick lookup before falling back to
//! a live resolve.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// A resolved package entry: the catalog's cache of "given this server
/// id and constraint, here's the concrete package we resolved to."
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Server id this resolution is for.
    pub server_id: String,
    /// Version constraint that was resolved (e.g. `"^1.2.0"`, `"latest"`).
    pub constraint: String,
    /// The concrete resolved version.
    pub resolved_version: String,
    /// Install command the resolver produced (e.g. `"npx -y @foo/bar@1.2.3"`).
    pub install_command: String,
    /// RFC 3339 timestamp of when this resolution was cached.
    pub resolved_at: String,
}

/// SQLite-backed catalog of server metadata and resolved packages.
///
/// One file, opened once at startup; all operations are synchronous
/// (`rusqlite` has no async API) and short enough not to warrant
/// spawning onto a blocking pool for Harbor's call volumes.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open (creating if absent) a catalog database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: impl AsRef<std::path::Path>) -> StorageResult<Self> {
        let conn = Connection::open(path).map_err(|e| StorageError::Connection(e.to_string()))?;
        let catalog = Self { conn };
        catalog.migrate()?;
        Ok(catalog)
    }

    /// Open an in-memory catalog (for tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::Connection(e.to_string()))?;
        let catalog = Self { conn };
        catalog.migrate()?;
        Ok(catalog)
    }

    fn migrate(&self) -> StorageResult<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS servers (
                    server_id TEXT PRIMARY KEY,
                    display_name TEXT NOT NULL,
                    description TEXT,
                    homepage TEXT,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS resolved_packages (
                    server_id TEXT NOT NULL,
                    constraint_str TEXT NOT NULL,
                    resolved_version TEXT NOT NULL,
                    install_command TEXT NOT NULL,
                    resolved_at TEXT NOT NULL,
                    PRIMARY KEY (server_id, constraint_str)
                );
                ",
            )
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(())
    }

    /// Upsert a catalog entry for a known server.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn put_server(
        &self,
        server_id: &str,
        display_name: &str,
        description: Option<&str>,
        homepage: Option<&str>,
        updated_at: &str,
    ) -> StorageResult<()> {
        self.conn
            .execute(
                "INSERT INTO servers (server_id, display_name, description, homepage, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(server_id) DO UPDATE SET
                    display_name = excluded.display_name,
                    description = excluded.description,
                    homepage = excluded.homepage,
                    updated_at = excluded.updated_at",
                params![server_id, display_name, description, homepage, updated_at],
            )
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(())
    }

    /// Fetch a cached resolution for `(server_id, constraint)`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn get_resolved_package(
        &self,
        server_id: &str,
        constraint: &str,
    ) -> StorageResult<Option<ResolvedPackage>> {
        self.conn
            .query_row(
                "SELECT server_id, constraint_str, resolved_version, install_command, resolved_at
                 FROM resolved_packages WHERE server_id = ?1 AND constraint_str = ?2",
                params![server_id, constraint],
                |row| {
                    Ok(ResolvedPackage {
                        server_id: row.get(0)?,
                        constraint: row.get(1)?,
                        resolved_version: row.get(2)?,
                        install_command: row.get(3)?,
                        resolved_at: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    /// Cache a resolution, overwriting any prior one for the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn put_resolved_package(&self, entry: &ResolvedPackage) -> StorageResult<()> {
        self.conn
            .execute(
                "INSERT INTO resolved_packages
                    (server_id, constraint_str, resolved_version, install_command, resolved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(server_id, constraint_str) DO UPDATE SET
                    resolved_version = excluded.resolved_version,
                    install_command = excluded.install_command,
                    resolved_at = excluded.resolved_at",
                params![
                    entry.server_id,
                    entry.constraint,
                    entry.resolved_version,
                    entry.install_command,
                    entry.resolved_at,
                ],
            )
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(())
    }

    /// Drop the cached resolution for a server, forcing a re-resolve.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn invalidate_resolved_packages(&self, server_id: &str) -> StorageResult<()> {
        self.conn
            .execute(
                "DELETE FROM resolved_packages WHERE server_id = ?1",
                params![server_id],
            )
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_package_round_trips() {
        let catalog = Catalog::open_memory().unwrap();
        let entry = ResolvedPackage {
            server_id: "fs-server".to_string(),
            constraint: "^1.0.0".to_string(),
            resolved_version: "1.2.3".to_string(),
            install_command: "npx -y @harbor/fs-server@1.2.3".to_string(),
            resolved_at: "2026-07-26T00:00:00Z".to_string(),
        };
        catalog.put_resolved_package(&entry).unwrap();

        let fetched = catalog
            .get_resolved_package("fs-server", "^1.0.0")
            .unwrap()
            .unwrap();
        assert_eq!(fetched, entry);
    }

    #[test]
    fn missing_resolution_is_none() {
        let catalog = Catalog::open_memory().unwrap();
        assert!(catalog.get_resolved_package("nope", "*").unwrap().is_none());
    }

    #[test]
    fn invalidate_clears_cached_resolution() {
        let catalog = Catalog::open_memory().unwrap();
        let entry = ResolvedPackage {
            server_id: "fs-server".to_string(),
            constraint: "*".to_string(),
            resolved_version: "1.0.0".to_string(),
            install_command: "npx fs-server".to_string(),
            resolved_at: "2026-07-26T00:00:00Z".to_string(),
        };
        catalog.put_resolved_package(&entry).unwrap();
        catalog.invalidate_resolved_packages("fs-server").unwrap();
        assert!(catalog
            .get_resolved_package("fs-server", "*")
            .unwrap()
            .is_none());
    }

    #[test]
    fn put_server_upserts() {
        let catalog = Catalog::open_memory().unwrap();
        catalog
            .put_server("fs-server", "Filesystem", None, None, "2026-07-26T00:00:00Z")
            .unwrap();
        catalog
            .put_server(
                "fs-server",
                "Filesystem v2",
                Some("desc"),
                Some("https://example.com"),
                "2026-07-27T00:00:00Z",
            )
            .unwrap();

        let display_name: String = catalog
            .conn
            .query_row(
                "SELECT display_name FROM servers WHERE server_id = ?1",
                params!["fs-server"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(display_name, "Filesystem v2");
    }
}
