//! Wire types carried inside native-messaging frames (§4.1, §6).

use serde::{Deserialize, Serialize};

/// A message read from the browser extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Liveness check; MUST be answered with [`OutboundFrame::Status`]
    /// carrying `"pong"`.
    Ping,
    /// A typed request dispatched to the Host Facade.
    Rpc {
        /// Correlates this request with its [`OutboundFrame::RpcResponse`].
        id: String,
        /// The Host Facade method name (e.g. `"listTools"`, `"callTool"`).
        method: String,
        /// Method parameters, shaped per-method.
        params: serde_json::Value,
    },
    /// A legacy, pre-RPC message kept for compatibility with older
    /// extension builds. Carries an opaque, untyped payload.
    Legacy {
        /// Opaque legacy payload, forwarded as-is to the legacy handler.
        payload: serde_json::Value,
    },
}

/// A message written back to the browser extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// An unsolicited status push (pong reply, orchestration step, server
    /// lifecycle notice — see `harbor_events::HarborEvent`).
    Status {
        /// Status payload; `"pong"` for ping replies, otherwise an event.
        payload: serde_json::Value,
    },
    /// The result of an [`InboundFrame::Rpc`] call.
    RpcResponse {
        /// Echoes the request's `id`.
        id: String,
        /// `Ok` result value, or `Err` with a wire error code and message.
        result: Result<serde_json::Value, RpcError>,
    },
    /// A legacy-shaped reply.
    Legacy {
        /// Opaque legacy payload.
        payload: serde_json::Value,
    },
}

/// Wire error shape for an [`OutboundFrame::RpcResponse`] (§7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    /// One of the twelve wire codes from `harbor_core::ErrorCode`.
    pub code: harbor_core::ErrorCode,
    /// Human-readable detail, safe to display to the extension user.
    pub message: String,
}

impl OutboundFrame {
    /// Build a pong reply to a [`InboundFrame::Ping`].
    #[must_use]
    pub fn pong() -> Self {
        Self::Status {
            payload: serde_json::json!("pong"),
        }
    }

    /// Build a successful RPC response.
    #[must_use]
    pub fn rpc_ok(id: impl Into<String>, value: serde_json::Value) -> Self {
        Self::RpcResponse {
            id: id.into(),
            result: Ok(value),
        }
    }

    /// Build a failed RPC response.
    #[must_use]
    pub fn rpc_err(id: impl Into<String>, code: harbor_core::ErrorCode, message: impl Into<String>) -> Self {
        Self::RpcResponse {
            id: id.into(),
            result: Err(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_round_trips_through_json() {
        let json = serde_json::to_string(&InboundFrame::Ping).unwrap();
        let back: InboundFrame = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, InboundFrame::Ping));
    }

    #[test]
    fn rpc_response_carries_error_code() {
        let frame = OutboundFrame::rpc_err("req-1", harbor_core::ErrorCode::NotFound, "no such session");
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "rpc_response");
        assert_eq!(json["result"]["Err"]["code"], "not_found");
    }

    #[test]
    fn pong_is_a_status_frame() {
        let frame = OutboundFrame::pong();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["payload"], "pong");
    }
}
