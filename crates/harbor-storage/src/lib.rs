//! Harbor Storage — on-disk persistence glue (§6).
//!
//! Everything Harbor keeps on disk lives behind this crate:
//!
//! - [`Catalog`] — a SQLite database for the server catalog and
//!   resolved-package cache.
//! - [`kv`] — a namespaced byte-level key-value abstraction, backed by
//!   plain JSON files on disk or held in memory for tests. Used for the
//!   installed-servers config and as the foundation for [`SecretStore`].
//! - [`SecretStore`] — one row per `(serverId, key)`; values are never
//!   logged (§6).
//!
//! Session persistence (one JSON file per session) lives in
//! `harbor-runtime`, which is the sole owner of session lifecycle; this
//! crate only provides the lower-level primitives other crates build
//! stores on top of.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod error;
pub mod kv;
pub mod secrets;

pub use catalog::{Catalog, ResolvedPackage};
pub use error::{StorageError, StorageResult};
pub use kv::{FileKvStore, KvEntry, KvStore, MemoryKvStore, ScopedKvStore};
pub use secrets::{CredentialKind, SecretStore, SecretValue};
