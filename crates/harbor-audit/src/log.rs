//! The audit log: appends entries and verifies per-session chain
//! integrity.

use std::sync::Arc;

use harbor_core::SessionId;
use harbor_crypto::ContentHash;

use crate::entry::{AuditAction, AuditEntry, AuditEntryId, AuditOutcome, AuthorizationProof};
use crate::error::AuditResult;
use crate::storage::{AuditStorage, MemoryAuditStorage};

/// Appends audit entries and verifies chain integrity, backed by a
/// pluggable [`AuditStorage`].
pub struct AuditLog {
    storage: Arc<dyn AuditStorage>,
}

impl AuditLog {
    /// Build a log over an arbitrary storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn AuditStorage>) -> Self {
        Self { storage }
    }

    /// Build a log backed by process memory; entries do not survive
    /// restart. Used in tests and by hosts that opt out of durable
    /// persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryAuditStorage::new()))
    }

    /// Append a new entry to a session's chain, automatically linking it
    /// to that session's current chain head.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn append(
        &self,
        session_id: SessionId,
        action: AuditAction,
        authorization: AuthorizationProof,
        outcome: AuditOutcome,
    ) -> AuditResult<AuditEntryId> {
        let previous_hash = match self.storage.get_chain_head(&session_id)? {
            Some(head_id) => self
                .storage
                .get(&head_id)?
                .map(|e| e.content_hash())
                .unwrap_or_else(ContentHash::zero),
            None => ContentHash::zero(),
        };

        let entry = AuditEntry::new(session_id, action, authorization, outcome, previous_hash);
        let id = entry.id;
        self.storage.store(&entry)?;
        Ok(id)
    }

    /// Start a builder for a fluent append call.
    #[must_use]
    pub fn for_session(&self, session_id: SessionId) -> AuditBuilder<'_> {
        AuditBuilder {
            log: self,
            session_id,
        }
    }

    /// Get an entry by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn get(&self, id: &AuditEntryId) -> AuditResult<Option<AuditEntry>> {
        self.storage.get(id)
    }

    /// Get all entries for a session in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn session_entries(&self, session_id: &SessionId) -> AuditResult<Vec<AuditEntry>> {
        self.storage.get_session_entries(session_id)
    }

    /// Verify that a session's chain is unbroken: each entry's
    /// `previous_hash` matches the content hash of the entry before it,
    /// starting from the genesis (zero) hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn verify_chain(&self, session_id: &SessionId) -> AuditResult<ChainVerificationResult> {
        let entries = self.storage.get_session_entries(session_id)?;
        let mut expected_previous = ContentHash::zero();
        let mut issues = Vec::new();

        for entry in &entries {
            if entry.previous_hash != expected_previous {
                issues.push(ChainIssue {
                    entry_id: entry.id,
                    reason: "previous_hash does not match the prior entry's content hash"
                        .to_string(),
                });
            }
            expected_previous = entry.content_hash();
        }

        Ok(ChainVerificationResult {
            valid: issues.is_empty(),
            entries_checked: entries.len(),
            issues,
        })
    }
}

/// Fluent helper for appending entries tied to one session.
pub struct AuditBuilder<'a> {
    log: &'a AuditLog,
    session_id: SessionId,
}

impl AuditBuilder<'_> {
    /// Append an entry for this builder's session.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn append(
        &self,
        action: AuditAction,
        authorization: AuthorizationProof,
        outcome: AuditOutcome,
    ) -> AuditResult<AuditEntryId> {
        self.log
            .append(self.session_id, action, authorization, outcome)
    }
}

/// A single detected chain-integrity problem.
#[derive(Debug, Clone)]
pub struct ChainIssue {
    /// The entry at which the break was detected.
    pub entry_id: AuditEntryId,
    /// Human-readable description of the problem.
    pub reason: String,
}

/// Result of [`AuditLog::verify_chain`].
#[derive(Debug, Clone)]
pub struct ChainVerificationResult {
    /// Whether the chain was found to be fully intact.
    pub valid: bool,
    /// Number of entries examined.
    pub entries_checked: usize,
    /// Every break found, in chain order.
    pub issues: Vec<ChainIssue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_chain_verifies_clean() {
        let log = AuditLog::in_memory();
        let session_id = SessionId::new();

        for i in 0..5 {
            log.append(
                session_id,
                AuditAction::McpToolCall {
                    server: "test".to_string(),
                    tool: format!("tool_{i}"),
                    args_hash: ContentHash::zero(),
                    run_id: None,
                },
                AuthorizationProof::NotRequired {
                    reason: "test".to_string(),
                },
                AuditOutcome::success(),
            )
            .unwrap();
        }

        let result = log.verify_chain(&session_id).unwrap();
        assert!(result.valid);
        assert_eq!(result.entries_checked, 5);
    }

    #[test]
    fn builder_appends_to_the_bound_session() {
        let log = AuditLog::in_memory();
        let session_id = SessionId::new();
        let builder = log.for_session(session_id);

        builder
            .append(
                AuditAction::ConfigReloaded,
                AuthorizationProof::System {
                    reason: "startup".to_string(),
                },
                AuditOutcome::success(),
            )
            .unwrap();

        assert_eq!(log.session_entries(&session_id).unwrap().len(), 1);
    }

    #[test]
    fn tampered_entry_breaks_verification() {
        let log = AuditLog::in_memory();
        let session_id = SessionId::new();

        let id = log
            .append(
                session_id,
                AuditAction::ConfigReloaded,
                AuthorizationProof::System {
                    reason: "startup".to_string(),
                },
                AuditOutcome::success(),
            )
            .unwrap();

        // Append a second entry whose previous_hash deliberately does not
        // match the first entry's content hash.
        let forged = AuditEntry::new(
            session_id,
            AuditAction::ConfigReloaded,
            AuthorizationProof::System {
                reason: "forged".to_string(),
            },
            AuditOutcome::success(),
            ContentHash::hash(b"not the real previous hash"),
        );
        log.storage.store(&forged).unwrap();

        let result = log.verify_chain(&session_id).unwrap();
        assert!(!result.valid);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].entry_id, forged.id);
        let _ = id;
    }
}
