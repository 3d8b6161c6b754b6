//! A small byte-level key-value abstraction, namespaced like the
//! teacher's `SurrealKV` tier but backed by plain files: one JSON blob
//! per namespace on disk, or nothing at all in the in-memory
//! implementation used by tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// A namespaced byte-level store.
///
/// Namespaces partition keys the way a table partitions rows; callers
/// pick a namespace per logical collection (e.g. `"secrets"`,
/// `"catalog:packages"`).
pub trait KvStore: Send + Sync {
    /// Fetch a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read.
    fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Store a value, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to write.
    fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()>;

    /// Remove a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to write.
    fn delete(&self, namespace: &str, key: &str) -> StorageResult<()>;

    /// List all keys in a namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read.
    fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>>;
}

/// A key/value pair, used by callers that want a typed read-all.
#[derive(Debug, Clone)]
pub struct KvEntry {
    /// The key.
    pub key: String,
    /// The raw value.
    pub value: Vec<u8>,
}

/// In-memory [`KvStore`]. Nothing survives process exit; used for tests
/// and for stores the caller explicitly doesn't want persisted.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    namespaces: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let namespaces = self
            .namespaces
            .read()
            .map_err(|_| StorageError::Internal("lock poisoned".to_string()))?;
        Ok(namespaces.get(namespace).and_then(|ns| ns.get(key).cloned()))
    }

    fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|_| StorageError::Internal("lock poisoned".to_string()))?;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, namespace: &str, key: &str) -> StorageResult<()> {
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|_| StorageError::Internal("lock poisoned".to_string()))?;
        if let Some(ns) = namespaces.get_mut(namespace) {
            ns.remove(key);
        }
        Ok(())
    }

    fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        let namespaces = self
            .namespaces
            .read()
            .map_err(|_| StorageError::Internal("lock poisoned".to_string()))?;
        Ok(namespaces
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default())
    }
}

/// File-backed [`KvStore`]: each namespace is one JSON file (a map of
/// key to base64-less byte array) under a root directory, read in full
/// on every access. Appropriate for the small, infrequently-written
/// namespaces Harbor uses it for (secrets, package-resolution cache) —
/// not a general-purpose database.
pub struct FileKvStore {
    root: PathBuf,
    cache: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl FileKvStore {
    /// Open (or create) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(Self {
            root,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json"))
    }

    fn load_namespace(&self, namespace: &str) -> StorageResult<HashMap<String, Vec<u8>>> {
        let path = self.namespace_path(namespace);
        if !Path::new(&path).exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&path).map_err(|e| StorageError::Internal(e.to_string()))?;
        let encoded: HashMap<String, Vec<u8>> =
            serde_json::from_str(&content).map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(encoded)
    }

    fn save_namespace(&self, namespace: &str, data: &HashMap<String, Vec<u8>>) -> StorageResult<()> {
        let content =
            serde_json::to_vec_pretty(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(self.namespace_path(namespace), content)
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    fn with_namespace<T>(
        &self,
        namespace: &str,
        f: impl FnOnce(&mut HashMap<String, Vec<u8>>) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut cache = self
            .cache
            .write()
            .map_err(|_| StorageError::Internal("lock poisoned".to_string()))?;
        if !cache.contains_key(namespace) {
            let loaded = self.load_namespace(namespace)?;
            cache.insert(namespace.to_string(), loaded);
        }
        let data = cache.get_mut(namespace).expect("just inserted");
        let result = f(data)?;
        self.save_namespace(namespace, data)?;
        Ok(result)
    }
}

impl KvStore for FileKvStore {
    fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let mut cache = self
            .cache
            .write()
            .map_err(|_| StorageError::Internal("lock poisoned".to_string()))?;
        if !cache.contains_key(namespace) {
            let loaded = self.load_namespace(namespace)?;
            cache.insert(namespace.to_string(), loaded);
        }
        Ok(cache.get(namespace).and_then(|ns| ns.get(key).cloned()))
    }

    fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.with_namespace(namespace, |data| {
            data.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn delete(&self, namespace: &str, key: &str) -> StorageResult<()> {
        self.with_namespace(namespace, |data| {
            data.remove(key);
            Ok(())
        })
    }

    fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        let mut cache = self
            .cache
            .write()
            .map_err(|_| StorageError::Internal("lock poisoned".to_string()))?;
        if !cache.contains_key(namespace) {
            let loaded = self.load_namespace(namespace)?;
            cache.insert(namespace.to_string(), loaded);
        }
        Ok(cache
            .get(namespace)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for FileKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKvStore").field("root", &self.root).finish_non_exhaustive()
    }
}

/// A [`KvStore`] wrapper that confines every operation to one fixed
/// namespace, so callers holding a `ScopedKvStore` cannot accidentally
/// read or write another namespace's keys.
#[derive(Clone)]
pub struct ScopedKvStore<S> {
    inner: std::sync::Arc<S>,
    namespace: String,
}

impl<S: KvStore> ScopedKvStore<S> {
    /// Scope `inner` to `namespace`.
    pub fn new(inner: std::sync::Arc<S>, namespace: impl Into<String>) -> Self {
        Self {
            inner,
            namespace: namespace.into(),
        }
    }

    /// Fetch a value from this store's namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read.
    pub fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(&self.namespace, key)
    }

    /// Store a value in this store's namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to write.
    pub fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.inner.set(&self.namespace, key, value)
    }

    /// Remove a value from this store's namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to write.
    pub fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(&self.namespace, key)
    }

    /// List all keys in this store's namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read.
    pub fn list_keys(&self) -> StorageResult<Vec<String>> {
        self.inner.list_keys(&self.namespace)
    }
}

#[derive(Serialize, Deserialize)]
struct _Unused; // keeps serde imports used on feature-trimmed builds

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryKvStore::new();
        store.set("ns", "k", b"v".to_vec()).unwrap();
        assert_eq!(store.get("ns", "k").unwrap(), Some(b"v".to_vec()));
        store.delete("ns", "k").unwrap();
        assert_eq!(store.get("ns", "k").unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileKvStore::open(dir.path()).unwrap();
            store.set("secrets", "k1", b"v1".to_vec()).unwrap();
        }
        let reopened = FileKvStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("secrets", "k1").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn scoped_store_confines_to_namespace() {
        let inner = std::sync::Arc::new(MemoryKvStore::new());
        let scoped_a = ScopedKvStore::new(inner.clone(), "a");
        let scoped_b = ScopedKvStore::new(inner, "b");

        scoped_a.set("k", b"from-a".to_vec()).unwrap();
        assert_eq!(scoped_b.get("k").unwrap(), None);
    }
}
