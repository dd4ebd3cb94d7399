//! Background polling loop.
//!
//! The sampler owns the poll cadence: it queries the workspace source on
//! a fixed interval, numbers every attempt with a cycle counter, and
//! publishes the outcome through a watch channel. The render loop reads
//! the latest batch at its own pace; if it falls behind, intermediate
//! batches coalesce away rather than queue up.
//!
//! Polls never overlap. A query is awaited inline and wrapped in a
//! timeout equal to the poll interval, so a slow source costs at most one
//! skipped tick, reported through [`SampleBatch::overrun`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::model::{Sample, Stamp};
use crate::source::{SourceError, WorkspaceSource};

/// Interval bounds for the `+`/`-` keys.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_INTERVAL: Duration = Duration::from_secs(30);

pub fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

/// Live tuning for the sampler, pushed from the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerControl {
    pub interval: Duration,
    pub paused: bool,
}

impl SamplerControl {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: clamp_interval(interval),
            paused: false,
        }
    }
}

/// Everything one poll attempt produced.
#[derive(Debug, Clone)]
pub struct SampleBatch {
    pub stamp: Stamp,
    /// The poll outlived its interval, so the next tick was skipped.
    pub overrun: bool,
    /// Consecutive failed polls up to and including this one; zero on
    /// success.
    pub consecutive_failures: u32,
    pub outcome: Result<Vec<Sample>, SourceError>,
}

/// Start the sampler task.
///
/// Returns the batch feed and the task handle. The task exits when the
/// cancellation token fires or every receiver of the feed is gone.
pub fn spawn(
    source: Arc<dyn WorkspaceSource>,
    mut control: watch::Receiver<SamplerControl>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) -> (watch::Receiver<Option<SampleBatch>>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(None);

    let handle = tokio::spawn(async move {
        let mut cfg = *control.borrow();
        let mut ticker = tokio::time::interval(cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut cycle: u64 = 0;
        let mut consecutive_failures: u32 = 0;

        loop {
            let poll_now = tokio::select! {
                _ = cancel.cancelled() => break,
                changed = control.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = *control.borrow_and_update();
                    if next.interval != cfg.interval {
                        ticker = tokio::time::interval(next.interval);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    }
                    cfg = next;
                    false
                }
                // Manual refresh works even while paused
                _ = refresh.notified() => true,
                _ = ticker.tick(), if !cfg.paused => true,
            };
            if !poll_now {
                continue;
            }

            cycle += 1;
            let stamp = Stamp::now(cycle);
            let poll_started = tokio::time::Instant::now();

            let outcome = match tokio::time::timeout(cfg.interval, source.query()).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::Timeout(cfg.interval)),
            };
            let overrun = poll_started.elapsed() >= cfg.interval;

            match &outcome {
                Ok(samples) => {
                    consecutive_failures = 0;
                    trace!(cycle, count = samples.len(), overrun, "poll completed");
                }
                Err(e) => {
                    consecutive_failures += 1;
                    debug!(cycle, failures = consecutive_failures, error = %e, "poll failed");
                }
            }

            let batch = SampleBatch {
                stamp,
                overrun,
                consecutive_failures,
                outcome,
            };
            if tx.send(Some(batch)).is_err() {
                break;
            }
        }
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReportedState, WorkspaceId};
    use crate::source::{ActionKind, ChannelSource};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn sample(name: &str) -> Sample {
        Sample {
            id: WorkspaceId::from_parts("nux", name),
            name: name.to_string(),
            rig: "nux".to_string(),
            state: ReportedState::Working,
            bead: None,
            session_id: None,
            running: true,
            attached: false,
            started_at_ms: None,
            last_activity_ms: None,
            counters: None,
        }
    }

    /// Source that plays back a fixed sequence of outcomes, then empty
    /// success forever.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<Sample>, SourceError>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<Sample>, SourceError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl WorkspaceSource for ScriptedSource {
        async fn query(&self) -> Result<Vec<Sample>, SourceError> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn act(&self, id: &WorkspaceId, action: ActionKind) -> Result<(), SourceError> {
            Err(SourceError::ActionFailed {
                action,
                id: id.clone(),
                reason: "scripted".to_string(),
            })
        }

        fn description(&self) -> String {
            "scripted".to_string()
        }
    }

    /// Source whose queries hang well past any poll interval.
    struct StuckSource;

    #[async_trait]
    impl WorkspaceSource for StuckSource {
        async fn query(&self) -> Result<Vec<Sample>, SourceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        async fn act(&self, id: &WorkspaceId, action: ActionKind) -> Result<(), SourceError> {
            Err(SourceError::ActionFailed {
                action,
                id: id.clone(),
                reason: "stuck".to_string(),
            })
        }

        fn description(&self) -> String {
            "stuck".to_string()
        }
    }

    fn harness(
        source: Arc<dyn WorkspaceSource>,
    ) -> (
        watch::Sender<SamplerControl>,
        Arc<Notify>,
        CancellationToken,
        watch::Receiver<Option<SampleBatch>>,
        JoinHandle<()>,
    ) {
        let (control_tx, control_rx) = watch::channel(SamplerControl::new(Duration::from_secs(1)));
        let refresh = Arc::new(Notify::new());
        let cancel = CancellationToken::new();
        let (feed, handle) = spawn(source, control_rx, refresh.clone(), cancel.clone());
        (control_tx, refresh, cancel, feed, handle)
    }

    async fn next_batch(feed: &mut watch::Receiver<Option<SampleBatch>>) -> SampleBatch {
        feed.changed().await.unwrap();
        feed.borrow_and_update().clone().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_number_cycles() {
        let (tx, source) = ChannelSource::create("test");
        tx.send(vec![sample("slit")]).unwrap();
        let (_control, _refresh, cancel, mut feed, handle) = harness(Arc::new(source));

        let first = next_batch(&mut feed).await;
        assert_eq!(first.stamp.cycle, 1);
        assert_eq!(first.outcome.unwrap().len(), 1);
        assert!(!first.overrun);

        let second = next_batch(&mut feed).await;
        assert_eq!(second.stamp.cycle, 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_count_consecutively() {
        let source = ScriptedSource::new(vec![
            Err(SourceError::Unavailable("down".to_string())),
            Err(SourceError::Unavailable("down".to_string())),
            Ok(vec![sample("slit")]),
        ]);
        let (_control, _refresh, cancel, mut feed, handle) = harness(Arc::new(source));

        assert_eq!(next_batch(&mut feed).await.consecutive_failures, 1);
        assert_eq!(next_batch(&mut feed).await.consecutive_failures, 2);

        let recovered = next_batch(&mut feed).await;
        assert_eq!(recovered.consecutive_failures, 0);
        assert!(recovered.outcome.is_ok());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_failure_with_overrun() {
        let (_control, _refresh, cancel, mut feed, handle) = harness(Arc::new(StuckSource));

        let batch = next_batch(&mut feed).await;
        assert!(matches!(batch.outcome, Err(SourceError::Timeout(_))));
        assert_eq!(batch.consecutive_failures, 1);
        assert!(batch.overrun);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_while_paused() {
        let (tx, source) = ChannelSource::create("test");
        tx.send(vec![sample("slit")]).unwrap();
        let (control, refresh, cancel, mut feed, handle) = harness(Arc::new(source));

        control.send_modify(|c| c.paused = true);
        refresh.notify_one();

        let batch = next_batch(&mut feed).await;
        assert!(batch.outcome.is_ok());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_the_task() {
        let (tx, source) = ChannelSource::create("test");
        tx.send(Vec::new()).unwrap();
        let (_control, _refresh, cancel, mut feed, handle) = harness(Arc::new(source));

        next_batch(&mut feed).await;
        cancel.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn test_interval_clamping() {
        assert_eq!(clamp_interval(Duration::from_millis(1)), MIN_INTERVAL);
        assert_eq!(clamp_interval(Duration::from_secs(90)), MAX_INTERVAL);
        assert_eq!(
            clamp_interval(Duration::from_millis(1500)),
            Duration::from_millis(1500)
        );
        assert!(!SamplerControl::new(Duration::from_millis(1500)).paused);
    }
}
