//! Real-time broadcast hub.
//!
//! Connected displays are registered as [`Sink`]s with a single fan-out loop
//! that owns the registry. Producers submit [`Envelope`]s through a cloneable
//! [`Hub`] handle; the loop writes each one to every live sink and evicts the
//! ones whose write fails.

pub mod events;
pub mod fanout;
pub mod heartbeat;
pub mod registry;
pub mod server;
pub mod sink;

pub use events::{Envelope, EventKind};
pub use fanout::{Hub, HubConfig, HubError};
pub use sink::{Sink, SinkError, SinkId};
