//! The set of live sinks, owned exclusively by the fan-out loop.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Bytes;
use futures_util::future::join_all;
use tokio::time;

use super::sink::{Sink, SinkError, SinkId};

/// A sink that was dropped from the registry during delivery.
#[derive(Debug)]
pub struct Eviction {
    pub sink_id: SinkId,
    pub error: SinkError,
}

/// Outcome of delivering one frame.
#[derive(Debug, Default)]
pub struct Delivery {
    pub delivered: usize,
    pub evicted: Vec<Eviction>,
}

/// Registered sinks keyed by connection identity.
///
/// Not `Sync` and never shared: the fan-out loop owns the only instance, so no
/// locking is needed.
#[derive(Default)]
pub struct Registry {
    sinks: HashMap<SinkId, Box<dyn Sink>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink. Returns `false` if the id was already present, in which case
    /// the existing entry is kept.
    pub fn insert(&mut self, sink_id: SinkId, sink: Box<dyn Sink>) -> bool {
        if self.sinks.contains_key(&sink_id) {
            return false;
        }
        self.sinks.insert(sink_id, sink);
        true
    }

    /// Remove a sink. Returns `false` if it was not registered.
    pub fn remove(&mut self, sink_id: &SinkId) -> bool {
        self.sinks.remove(sink_id).is_some()
    }

    pub fn contains(&self, sink_id: &SinkId) -> bool {
        self.sinks.contains_key(sink_id)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Ids of all registered sinks, sorted for stable output.
    pub fn ids(&self) -> Vec<SinkId> {
        let mut ids: Vec<SinkId> = self.sinks.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Write `frame` to every registered sink.
    ///
    /// All writes run concurrently and each is bounded by `write_timeout`, so a
    /// stalled client delays the whole delivery by at most that long. Sinks
    /// whose write failed are removed once every write has settled.
    pub async fn deliver(&mut self, frame: &Bytes, write_timeout: Duration) -> Delivery {
        let timeout_ms = u64::try_from(write_timeout.as_millis()).unwrap_or(u64::MAX);

        let writes = self.sinks.iter_mut().map(|(sink_id, sink)| {
            let frame = frame.clone();
            async move {
                let result = match time::timeout(write_timeout, sink.send(frame)).await {
                    Ok(result) => result,
                    Err(_elapsed) => Err(SinkError::Timeout { ms: timeout_ms }),
                };
                (sink_id.clone(), result)
            }
        });
        let results = join_all(writes).await;

        let mut delivery = Delivery::default();
        for (sink_id, result) in results {
            match result {
                Ok(()) => delivery.delivered += 1,
                Err(error) => delivery.evicted.push(Eviction { sink_id, error }),
            }
        }

        for eviction in &delivery.evicted {
            self.sinks.remove(&eviction.sink_id);
        }

        delivery
    }
}
