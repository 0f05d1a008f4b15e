//! Client sinks: the write-only view the fan-out loop has of a connection.

use std::fmt;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tally_common::id::{prefix, PrefixedId};
use tokio::sync::oneshot;

/// Identity of one registered connection (`conn_` prefixed ULID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(String);

impl PrefixedId for SinkId {
    const PREFIX: &'static str = prefix::CONNECTION;
}

impl SinkId {
    pub fn new() -> Self {
        Self(<Self as PrefixedId>::generate())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a write to a sink failed. Any variant evicts the sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The transport rejected the frame.
    #[error("write failed: {0}")]
    Write(String),

    /// The write did not finish inside the hub's write timeout.
    #[error("write timed out after {ms}ms")]
    Timeout { ms: u64 },
}

/// One outbound connection. The hub only ever writes to it.
#[async_trait]
pub trait Sink: Send {
    async fn send(&mut self, frame: Bytes) -> Result<(), SinkError>;
}

/// Write half of an upgraded WebSocket.
///
/// Holds the sender side of a oneshot whose receiver lives in the connection's
/// reader task: when the hub drops an evicted sink, the reader observes the
/// closed channel and tears the socket down.
pub struct WsSink {
    tx: SplitSink<WebSocket, Message>,
    _evicted: oneshot::Sender<()>,
}

impl WsSink {
    pub fn new(tx: SplitSink<WebSocket, Message>, evicted: oneshot::Sender<()>) -> Self {
        Self {
            tx,
            _evicted: evicted,
        }
    }
}

#[async_trait]
impl Sink for WsSink {
    async fn send(&mut self, frame: Bytes) -> Result<(), SinkError> {
        // Envelope frames are JSON, so always valid UTF-8.
        let text = Utf8Bytes::try_from(frame).map_err(|e| SinkError::Write(e.to_string()))?;
        self.tx
            .send(Message::Text(text))
            .await
            .map_err(|e| SinkError::Write(e.to_string()))
    }
}
