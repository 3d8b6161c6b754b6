//! Request correlation: a short-lived context carrying a component name,
//! an optional operation name, and a request id, materialized as a
//! `tracing` span so every log line emitted while it's entered carries
//! the same correlation fields.

use tracing::Span;
use uuid::Uuid;

/// A request's correlation fields, turned into a `tracing` span on
/// demand.
#[derive(Debug, Clone)]
pub struct RequestContext {
    component: String,
    operation: Option<String>,
    request_id: Uuid,
}

impl RequestContext {
    /// Start a context for `component` (e.g. `"harbor-host"`,
    /// `"harbor-mcp"`), stamping a fresh request id.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            operation: None,
            request_id: Uuid::new_v4(),
        }
    }

    /// Attach an operation name (e.g. `"call_tool"`).
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// The request id correlating every log line within this context.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Build (but do not enter) the `tracing` span for this context.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "request",
            component = %self.component,
            operation = self.operation.as_deref().unwrap_or("-"),
            request_id = %self.request_id,
        )
    }

    /// Enter the span for the lifetime of the returned guard.
    #[must_use]
    pub fn enter(&self) -> RequestGuard {
        RequestGuard {
            entered: self.span().entered(),
        }
    }
}

/// Keeps a [`RequestContext`]'s span entered until dropped.
pub struct RequestGuard {
    entered: tracing::span::EnteredSpan,
}

impl std::fmt::Debug for RequestGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGuard").field("span", &self.entered.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_operation_sets_the_field() {
        let ctx = RequestContext::new("harbor-host").with_operation("call_tool");
        assert_eq!(ctx.operation.as_deref(), Some("call_tool"));
    }

    #[test]
    fn each_context_gets_a_distinct_request_id() {
        let a = RequestContext::new("harbor-host");
        let b = RequestContext::new("harbor-host");
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn enter_produces_a_guard() {
        let ctx = RequestContext::new("harbor-host");
        let _guard = ctx.enter();
        tracing::info!("inside the span");
    }
}
