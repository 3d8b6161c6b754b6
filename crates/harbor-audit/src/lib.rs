//! Harbor Audit — append-only, chain-linked audit logging.
//!
//! This crate provides:
//! - Audit entries for every Host Facade operation (§4.6)
//! - Chain-linked entries (each carries the content hash of the one
//!   before it in its session) so tampering with history is detectable
//! - Pluggable storage: in-memory for tests, append-only JSON-lines for
//!   durable hosts
//!
//! # Example
//!
//! ```
//! use harbor_audit::{AuditAction, AuditLog, AuditOutcome, AuthorizationProof};
//! use harbor_core::SessionId;
//!
//! let log = AuditLog::in_memory();
//! let session_id = SessionId::new();
//!
//! let entry_id = log.append(
//!     session_id,
//!     AuditAction::ConfigReloaded,
//!     AuthorizationProof::System {
//!         reason: "startup".to_string(),
//!     },
//!     AuditOutcome::success(),
//! ).unwrap();
//!
//! let result = log.verify_chain(&session_id).unwrap();
//! assert!(result.valid);
//! # let _ = entry_id;
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod entry;
mod error;
mod log;
mod storage;

pub use entry::{AuditAction, AuditEntry, AuditEntryId, AuditOutcome, AuthorizationProof};
pub use error::{AuditError, AuditResult};
pub use log::{AuditBuilder, AuditLog, ChainIssue, ChainVerificationResult};
pub use storage::{AuditStorage, FileAuditStorage, MemoryAuditStorage};
