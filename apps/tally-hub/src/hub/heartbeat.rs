//! Periodic keep-alive broadcast.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::events::{Envelope, EventKind};
use super::fanout::Hub;

/// Default heartbeat period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Broadcast a `heartbeat` envelope every `period` until the hub closes.
///
/// The first beat fires one full period after start. Ticks missed while a
/// broadcast was waiting for intake capacity are skipped, not replayed.
pub fn spawn(hub: Hub, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if hub
                .broadcast(Envelope::empty(EventKind::Heartbeat))
                .await
                .is_err()
            {
                tracing::info!("hub closed, heartbeat stopped");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::hub::fanout::HubConfig;
    use crate::hub::sink::testing::{RecordingSink, StalledSink};
    use super::*;

    const HEARTBEAT: &[u8] = br#"{"type":"heartbeat","body":null}"#;

    fn count_beats(rx: &mut tokio::sync::mpsc::UnboundedReceiver<axum::body::Bytes>) -> usize {
        let mut beats = 0;
        while let Ok(frame) = rx.try_recv() {
            if frame.as_ref() == HEARTBEAT {
                beats += 1;
            }
        }
        beats
    }

    #[tokio::test(start_paused = true)]
    async fn beats_on_fixed_period() {
        let hub = Hub::spawn(HubConfig::default());
        let (sink, mut rx) = RecordingSink::pair();
        hub.register(sink).await.unwrap();

        let beat = spawn(hub.clone(), Duration::from_secs(5));

        time::sleep(Duration::from_millis(4_900)).await;
        hub.sinks().await.unwrap();
        assert!(rx.try_recv().is_err(), "no beat before the first period");

        time::sleep(Duration::from_millis(10_200)).await;
        hub.sinks().await.unwrap();

        assert_eq!(count_beats(&mut rx), 3);

        beat.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn beats_are_independent_of_other_traffic() {
        let hub = Hub::spawn(HubConfig::default());
        let (sink, mut rx) = RecordingSink::pair();
        hub.register(sink).await.unwrap();
        let beat = spawn(hub.clone(), Duration::from_secs(1));

        for _ in 0..50 {
            hub.broadcast(Envelope::empty(EventKind::Clear)).await.unwrap();
        }
        time::sleep(Duration::from_millis(3_500)).await;
        hub.sinks().await.unwrap();

        assert_eq!(count_beats(&mut rx), 3);

        beat.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_missed_during_a_stall_are_skipped() {
        // One-slot intake and a sink that holds the loop for ten periods.
        let hub = Hub::spawn(HubConfig {
            intake_capacity: 1,
            write_timeout: Duration::from_secs(10),
        });
        let (sink, mut rx) = RecordingSink::pair();
        hub.register(StalledSink).await.unwrap();
        hub.register(sink).await.unwrap();
        hub.sinks().await.unwrap();

        let beat = spawn(hub.clone(), Duration::from_secs(1));
        hub.broadcast(Envelope::empty(EventKind::Clear)).await.unwrap();

        // The loop is stuck until t=10. Beat 1 waits in the intake slot, beat 2
        // waits for capacity, and the tick due at t=3 fires once the loop frees
        // up. Ticks due at t=4..=10 are dropped.
        time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(hub.sinks().await.unwrap().len(), 1, "stalled sink evicted");
        assert_eq!(count_beats(&mut rx), 3);

        // Back on the fixed schedule afterwards.
        time::sleep(Duration::from_secs(1)).await;
        hub.sinks().await.unwrap();
        assert_eq!(count_beats(&mut rx), 1);

        beat.abort();
    }
}
