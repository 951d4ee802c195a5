//! Periodic progress sampling.
//!
//! The reporter never touches the copy loop: it only re-reads the local
//! file's length through the filesystem. The length only grows while a
//! download runs, so a stale read lags behind but is never wrong.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::file::format_size;

use super::TransferOutcome;

/// Point-in-time view of a running download.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Bytes present in the local file
    pub downloaded: u64,
    /// Size of the remote file
    pub total: u64,
    /// When the sample was taken
    pub timestamp: Instant,
}

impl ProgressSample {
    /// Create a sample stamped with the current time.
    #[must_use]
    pub fn new(downloaded: u64, total: u64) -> Self {
        Self {
            downloaded,
            total,
            timestamp: Instant::now(),
        }
    }

    /// Completion percentage; see [`percentage`].
    #[must_use]
    pub fn percentage(&self) -> f64 {
        percentage(self.downloaded, self.total)
    }
}

impl fmt::Display for ProgressSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total: {}, downloaded: {}, progress: {:.2}%",
            format_size(self.total),
            format_size(self.downloaded),
            self.percentage()
        )
    }
}

/// `downloaded * 100 / total`. An empty remote file counts as fully
/// downloaded.
#[must_use]
pub fn percentage(downloaded: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    downloaded as f64 * 100.0 / total as f64
}

/// Receives the human-facing events of a download.
///
/// Implementations must be cheap; they are called from the reporter task
/// and from the engine between I/O calls.
pub trait ProgressSink: Send + Sync {
    /// One reporter tick.
    fn sample(&self, sample: &ProgressSample);

    /// The local file already held `offset` bytes and the copy continues
    /// from there.
    fn resumed(&self, _offset: u64) {}

    /// The download reached a successful terminal state.
    fn finished(&self, _outcome: &TransferOutcome) {}
}

/// Background task emitting one [`ProgressSample`] per interval.
#[derive(Debug)]
pub struct ProgressReporter {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// Start sampling `path` against the fixed `total`.
    ///
    /// The first sample is taken one `interval` after the start.
    #[must_use]
    pub fn spawn(
        path: PathBuf,
        total: u64,
        interval: Duration,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let first_tick = Instant::now() + interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let downloaded = match tokio::fs::metadata(&path).await {
                    Ok(metadata) => metadata.len(),
                    Err(e) => {
                        tracing::debug!(
                            path = %path.display(),
                            error = %e,
                            "Skipping progress tick"
                        );
                        continue;
                    }
                };

                if cancelled.is_cancelled() {
                    break;
                }

                sink.sample(&ProgressSample::new(downloaded, total));
            }

            tracing::debug!("Progress reporter stopped");
        });

        Self { token, handle }
    }

    /// Signal the task and wait until it has exited.
    ///
    /// No sample is delivered once this returns.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Progress reporter task failed");
        }
    }
}
