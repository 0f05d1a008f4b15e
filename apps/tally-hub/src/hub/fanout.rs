//! Broadcast hub: a cloneable handle in front of a single fan-out loop.
//!
//! Every registration, unregistration and broadcast travels through one
//! bounded intake channel to the loop task, which is the sole owner of the
//! [`Registry`]. Submissions are therefore processed strictly in arrival order
//! and the registry is never touched concurrently. A full intake channel makes
//! callers wait, which is the backpressure when the loop falls behind.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::events::Envelope;
use super::registry::Registry;
use super::sink::{Sink, SinkId};

/// Default bound on queued intake messages.
pub const DEFAULT_INTAKE_CAPACITY: usize = 64;

/// Default per-sink write bound.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The fan-out loop is no longer running.
    #[error("broadcast hub is closed")]
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    pub intake_capacity: usize,
    pub write_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

enum Command {
    Register { sink_id: SinkId, sink: Box<dyn Sink> },
    Unregister(SinkId),
    Broadcast(Envelope),
    Inspect(oneshot::Sender<Vec<SinkId>>),
}

/// Handle to the broadcast hub. Cheap to clone; store it in `AppState`.
///
/// The fan-out loop stops once every handle has been dropped.
#[derive(Clone)]
pub struct Hub {
    intake: mpsc::Sender<Command>,
}

impl Hub {
    /// Start the fan-out loop on the current tokio runtime.
    pub fn spawn(config: HubConfig) -> Self {
        let (intake, rx) = mpsc::channel(config.intake_capacity.max(1));
        tokio::spawn(run(rx, config.write_timeout));
        Self { intake }
    }

    /// Register a freshly upgraded connection.
    ///
    /// The sink receives every envelope broadcast after this call returns and
    /// none broadcast before it.
    pub async fn register<S>(&self, sink: S) -> Result<SinkId, HubError>
    where
        S: Sink + 'static,
    {
        let sink_id = SinkId::new();
        self.submit(Command::Register {
            sink_id: sink_id.clone(),
            sink: Box::new(sink),
        })
        .await?;
        Ok(sink_id)
    }

    /// Drop a sink whose connection closed. Unknown ids are ignored.
    pub async fn unregister(&self, sink_id: SinkId) -> Result<(), HubError> {
        self.submit(Command::Unregister(sink_id)).await
    }

    /// Queue an envelope for delivery to every registered sink.
    ///
    /// Fire-and-forget: failing sinks are evicted and never reported back.
    pub async fn broadcast(&self, envelope: Envelope) -> Result<(), HubError> {
        self.submit(Command::Broadcast(envelope)).await
    }

    /// Snapshot of the registry, as seen by the loop after everything
    /// submitted before this call.
    pub async fn sinks(&self) -> Result<Vec<SinkId>, HubError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Inspect(reply)).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    async fn submit(&self, command: Command) -> Result<(), HubError> {
        self.intake.send(command).await.map_err(|_| HubError::Closed)
    }
}

/// The fan-out loop. Owns the registry for its whole lifetime.
async fn run(mut intake: mpsc::Receiver<Command>, write_timeout: Duration) {
    let mut registry = Registry::new();
    tracing::info!(write_timeout_ms = write_timeout.as_millis() as u64, "broadcast hub started");

    while let Some(command) = intake.recv().await {
        match command {
            Command::Register { sink_id, sink } => {
                if registry.insert(sink_id.clone(), sink) {
                    tracing::info!(%sink_id, connections = registry.len(), "sink registered");
                } else {
                    tracing::warn!(%sink_id, "duplicate sink id ignored");
                }
            }
            Command::Unregister(sink_id) => {
                if registry.remove(&sink_id) {
                    tracing::info!(%sink_id, connections = registry.len(), "sink unregistered");
                }
            }
            Command::Broadcast(envelope) => {
                let delivery = registry.deliver(envelope.frame(), write_timeout).await;
                for eviction in &delivery.evicted {
                    tracing::warn!(
                        sink_id = %eviction.sink_id,
                        error = %eviction.error,
                        kind = %envelope.kind(),
                        "evicting sink after failed write"
                    );
                }
                tracing::debug!(
                    kind = %envelope.kind(),
                    delivered = delivery.delivered,
                    evicted = delivery.evicted.len(),
                    "envelope fanned out"
                );
            }
            Command::Inspect(reply) => {
                let _ = reply.send(registry.ids());
            }
        }
    }

    tracing::info!(connections = registry.len(), "broadcast hub stopped");
}
