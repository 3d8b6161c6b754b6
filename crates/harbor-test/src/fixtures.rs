//! Fixtures for common Harbor domain types, for tests that don't care
//! about the exact value, only that it's well-formed.

use harbor_core::{Origin, SessionId};

/// A well-formed test origin (`https://harbor-test.example`).
#[must_use]
pub fn test_origin() -> Origin {
    Origin::new("https://harbor-test.example").expect("fixture origin must parse")
}

/// A well-formed test origin built from a given host, for tests that
/// need several distinct origins.
#[must_use]
pub fn test_origin_for(host: &str) -> Origin {
    Origin::new(format!("https://{host}")).expect("fixture origin must parse")
}

/// A fresh random session id.
#[must_use]
pub fn test_session_id() -> SessionId {
    SessionId::new()
}
