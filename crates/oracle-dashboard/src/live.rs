//! Periodic re-analysis of one pair.
//!
//! Each poll runs as its own task, so replies can arrive out of order. Every
//! request is sequence-stamped and a reply older than one already shown is
//! dropped.

use oracle_core::{AnalysisRequest, AnalysisResult, DashboardApi, GatewayError, GatewayResult, LiveModeConfig};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// Hands out request numbers and remembers the newest one accepted.
#[derive(Debug, Default)]
pub struct AnalysisSequencer {
    issued: AtomicU64,
    latest: AtomicU64,
}

impl AnalysisSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a new request. Numbers start at 1.
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// True if `seq` is newer than anything accepted so far; it then becomes the latest.
    pub fn accept(&self, seq: u64) -> bool {
        self.latest.fetch_max(seq, Ordering::AcqRel) < seq
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub enum LiveEvent {
    Update { seq: u64, result: AnalysisResult },
    Failed { seq: u64, error: GatewayError },
    /// A reply that arrived after a newer one had been shown
    Stale { seq: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveSummary {
    pub issued: u32,
    pub updates: u32,
    pub failures: u32,
    pub stale: u32,
}

pub struct LiveMonitor {
    api: Arc<dyn DashboardApi>,
    request: AnalysisRequest,
    interval: Duration,
    max_updates: u32,
}

impl LiveMonitor {
    pub fn new(api: Arc<dyn DashboardApi>, request: AnalysisRequest, config: &LiveModeConfig) -> Self {
        Self {
            api,
            request,
            interval: config.update_interval,
            max_updates: config.max_updates,
        }
    }

    /// Poll until `max_updates` requests have been issued and answered, or
    /// until `shutdown` resolves. Requests still in flight at shutdown are
    /// abandoned.
    pub async fn run<S, F>(&self, shutdown: S, mut on_event: F) -> LiveSummary
    where
        S: Future<Output = ()>,
        F: FnMut(LiveEvent),
    {
        let mut summary = LiveSummary::default();
        if self.max_updates == 0 {
            return summary;
        }

        let sequencer = AnalysisSequencer::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<(u64, GatewayResult<AnalysisResult>)>();
        let mut ticker = time::interval(self.interval);
        let mut in_flight = 0usize;
        tokio::pin!(shutdown);

        tracing::info!(
            "Live mode for {} every {:?}, up to {} updates",
            self.request.pair,
            self.interval,
            self.max_updates
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Live mode stopped with {} requests in flight", in_flight);
                    break;
                }
                _ = ticker.tick(), if summary.issued < self.max_updates => {
                    summary.issued += 1;
                    in_flight += 1;
                    let seq = sequencer.begin();
                    let api = Arc::clone(&self.api);
                    let request = self.request.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let outcome = api.analyze_trade(&request).await;
                        let _ = tx.send((seq, outcome));
                    });
                }
                Some((seq, outcome)) = rx.recv() => {
                    in_flight -= 1;
                    if !sequencer.accept(seq) {
                        tracing::debug!("Dropping stale analysis #{}", seq);
                        summary.stale += 1;
                        on_event(LiveEvent::Stale { seq });
                    } else {
                        match outcome {
                            Ok(result) => {
                                summary.updates += 1;
                                on_event(LiveEvent::Update { seq, result });
                            }
                            Err(error) => {
                                tracing::warn!("Live analysis #{} failed: {}", seq, error);
                                summary.failures += 1;
                                on_event(LiveEvent::Failed { seq, error });
                            }
                        }
                    }
                    if summary.issued >= self.max_updates && in_flight == 0 {
                        tracing::info!("Live mode reached {} updates", self.max_updates);
                        break;
                    }
                }
            }
        }

        summary
    }
}
