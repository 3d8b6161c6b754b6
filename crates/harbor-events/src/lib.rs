//! Harbor Events - in-process broadcast bus for push events.
//!
//! `harbor-mcp` and `harbor-runtime` publish [`HarborEvent`]s (orchestration
//! steps, server crashes/restarts, usage) onto a single process-wide
//! [`EventBus`]; `harbor-host` subscribes once per Transport connection and
//! forwards them as native-messaging `status` frames (§4.1/§4.6).
//!
//! # Example
//!
//! ```rust
//! use harbor_core::SessionId;
//! use harbor_events::{EventBus, EventMetadata, HarborEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! bus.publish(HarborEvent::ServerStarted {
//!     metadata: EventMetadata::new("mcp"),
//!     server_id: "gmail".to_string(),
//! });
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "server_started");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::{EventMetadata, HarborEvent, OrchestrationStep};
