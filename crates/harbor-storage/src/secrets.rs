//! Secret store: one row per `(serverId, key)` (§6), values never
//! logged. Backed by [`FileKvStore`](crate::kv::FileKvStore) in the
//! `"secrets"` namespace; the key under that namespace is
//! `"{server_id}:{key}"`.

use std::sync::Arc;

use crate::error::StorageResult;
use crate::kv::KvStore;

/// A credential value. `Debug` and `Display` are deliberately not
/// derived from the inner string — printing one always yields a fixed
/// redaction marker, so an accidental `tracing::info!("{secret:?}")`
/// or inclusion in a larger struct's derived `Debug` cannot leak it.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wrap a raw secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value. Callers MUST NOT log or persist the
    /// result anywhere other than the destination that needs it
    /// (a provider HTTP client, a subprocess's environment).
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretValue(<redacted>)")
    }
}

/// The kind of credential, mirroring spec §2's `Credential` entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// A bearer API key.
    ApiKey,
    /// A username/password pair, stored as a single opaque value.
    Password,
    /// An OAuth access or refresh token.
    OauthToken,
}

fn row_key(server_id: &str, key: &str) -> String {
    format!("{server_id}:{key}")
}

const NAMESPACE: &str = "secrets";

/// Store and retrieve per-server credentials.
pub struct SecretStore {
    kv: Arc<dyn KvStore>,
}

impl SecretStore {
    /// Wrap a [`KvStore`] as a secret store.
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Store a credential for `(server_id, key)`, overwriting any
    /// prior value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn set(&self, server_id: &str, key: &str, value: &SecretValue) -> StorageResult<()> {
        self.kv
            .set(NAMESPACE, &row_key(server_id, key), value.0.as_bytes().to_vec())
    }

    /// Fetch a credential, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails or the stored bytes
    /// are not valid UTF-8.
    pub fn get(&self, server_id: &str, key: &str) -> StorageResult<Option<SecretValue>> {
        let raw = self.kv.get(NAMESPACE, &row_key(server_id, key))?;
        raw.map(|bytes| {
            String::from_utf8(bytes)
                .map(SecretValue)
                .map_err(|e| crate::error::StorageError::Serialization(e.to_string()))
        })
        .transpose()
    }

    /// Remove a credential, e.g. on server uninstall (§2).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn delete(&self, server_id: &str, key: &str) -> StorageResult<()> {
        self.kv.delete(NAMESPACE, &row_key(server_id, key))
    }

    /// Remove every credential belonging to `server_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read or write fails.
    pub fn delete_all_for_server(&self, server_id: &str) -> StorageResult<()> {
        let prefix = format!("{server_id}:");
        for k in self.kv.list_keys(NAMESPACE)? {
            if k.starts_with(&prefix) {
                self.kv.delete(NAMESPACE, &k)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;

    #[test]
    fn secret_round_trips() {
        let store = SecretStore::new(Arc::new(MemoryKvStore::new()));
        store
            .set("fs-server", "api_key", &SecretValue::new("sk-abc123"))
            .unwrap();
        let fetched = store.get("fs-server", "api_key").unwrap().unwrap();
        assert_eq!(fetched.expose(), "sk-abc123");
    }

    #[test]
    fn debug_never_exposes_value() {
        let secret = SecretValue::new("super-secret");
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn delete_all_for_server_scopes_to_prefix() {
        let store = SecretStore::new(Arc::new(MemoryKvStore::new()));
        store
            .set("fs-server", "api_key", &SecretValue::new("a"))
            .unwrap();
        store
            .set("other-server", "api_key", &SecretValue::new("b"))
            .unwrap();

        store.delete_all_for_server("fs-server").unwrap();

        assert!(store.get("fs-server", "api_key").unwrap().is_none());
        assert!(store.get("other-server", "api_key").unwrap().is_some());
    }
}
