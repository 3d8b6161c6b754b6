//! Prelude module - commonly used types for convenient import.
//!
//! Use `use harbor_audit::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use harbor_audit::prelude::*;
//! use harbor_core::SessionId;
//!
//! let log = AuditLog::in_memory();
//!
//! let session_id = SessionId::new();
//! let entry_id = log.append(
//!     session_id,
//!     AuditAction::ConfigReloaded,
//!     AuthorizationProof::System {
//!         reason: "session start".to_string(),
//!     },
//!     AuditOutcome::success(),
//! ).unwrap();
//!
//! let result = log.verify_chain(&session_id).unwrap();
//! assert!(result.valid);
//! # let _ = entry_id;
//! ```

// Errors
pub use crate::{AuditError, AuditResult};

// Entry types
pub use crate::{AuditAction, AuditEntry, AuditEntryId, AuditOutcome, AuthorizationProof};

// Log and verification
pub use crate::{AuditBuilder, AuditLog, ChainIssue, ChainVerificationResult};

// Storage
pub use crate::{AuditStorage, FileAuditStorage, MemoryAuditStorage};
