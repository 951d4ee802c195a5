//! Resumable single-file transfer engine.
//!
//! A download walks through a small state machine:
//!
//! ```text
//! Init -> Planning -> Skipped
//!                  -> Transferring -> Done
//!                                  -> Failed
//! ```
//!
//! Planning compares the remote size with whatever is already on disk (see
//! [`resume`]). While transferring, the engine copies the remote stream into
//! the local file in bounded chunks and a [`progress::ProgressReporter`] task
//! samples the local size in the background. On every exit path the reporter
//! is stopped and joined before the engine returns.
//!
//! Nothing is retried. A failed run leaves the local file as a valid prefix
//! of the remote file, and running again continues from its end.

pub mod progress;
pub mod resume;

use std::future::Future;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::file;

pub use progress::{ProgressReporter, ProgressSample, ProgressSink};
pub use resume::{plan, ResumeDecision};

/// A readable, seekable remote file.
///
/// The engine is the only reader; it seeks at most once, before the first
/// read.
pub trait RemoteSource: AsyncRead + AsyncSeek + Unpin + Send {
    /// Current size of the remote file in bytes.
    fn stat_size(&mut self) -> impl Future<Output = io::Result<u64>> + Send;

    /// Release the remote handle and anything keeping it alive.
    fn close(&mut self) -> impl Future<Output = io::Result<()>> + Send {
        async { Ok(()) }
    }
}

impl RemoteSource for tokio::fs::File {
    async fn stat_size(&mut self) -> io::Result<u64> {
        Ok(self.metadata().await?.len())
    }
}

impl<T> RemoteSource for io::Cursor<T>
where
    T: AsRef<[u8]> + Unpin + Send,
{
    async fn stat_size(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().as_ref().len() as u64)
    }
}

/// Lifecycle of one download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// Handles supplied, nothing done yet
    Init,
    /// Reading remote and local sizes
    Planning,
    /// Local file was already complete
    Skipped,
    /// Copying bytes
    Transferring,
    /// Copy finished
    Done,
    /// Aborted with an error
    Failed,
}

impl TransferState {
    /// Whether no further transition will happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Skipped | Self::Done | Self::Failed)
    }
}

/// Successful terminal result of a download.
///
/// Failures are reported through [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Local file already matched the remote size; nothing was read.
    AlreadyComplete {
        /// Size of the file in bytes
        size: u64,
    },
    /// The copy ran to end-of-file.
    Completed {
        /// Bytes copied during this run
        bytes_transferred: u64,
        /// Offset the run started from (0 for a fresh download)
        resumed_from: u64,
        /// Size of the remote file
        total: u64,
        /// Time spent copying
        elapsed: Duration,
    },
}

/// Drives a single download from planning to completion.
#[derive(Debug)]
pub struct TransferEngine {
    local_path: PathBuf,
    remote_label: String,
    report_interval: Duration,
    chunk_size: usize,
    state_tx: watch::Sender<TransferState>,
}

impl TransferEngine {
    /// Create an engine writing to `local_path` with default settings.
    #[must_use]
    pub fn new(local_path: impl Into<PathBuf>) -> Self {
        let (state_tx, _) = watch::channel(TransferState::Init);
        Self {
            local_path: local_path.into(),
            remote_label: "remote file".to_string(),
            report_interval: Duration::from_secs(crate::DEFAULT_REPORT_INTERVAL_SECS),
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
            state_tx,
        }
    }

    /// Create an engine for a resolved download.
    #[must_use]
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::new(&config.local_path)
            .with_remote_label(&config.remote_path)
            .with_report_interval(config.report_interval)
            .with_chunk_size(config.chunk_size)
    }

    /// Name used for the remote file in errors.
    #[must_use]
    pub fn with_remote_label(mut self, label: impl Into<String>) -> Self {
        self.remote_label = label.into();
        self
    }

    /// Time between two progress samples.
    #[must_use]
    pub const fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Size of the copy buffer.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Local file path.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Subscribe to state transitions.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<TransferState> {
        self.state_tx.subscribe()
    }

    /// Run the download to a terminal state.
    ///
    /// The remote handle is closed before returning, whatever the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stat`] or [`Error::LocalLargerThanRemote`] if
    /// planning fails, [`Error::Open`] or [`Error::Seek`] if the handles
    /// cannot be prepared, and [`Error::Copy`] if the stream breaks.
    pub async fn run<R: RemoteSource>(
        &self,
        mut remote: R,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<TransferOutcome> {
        let result = self.transfer(&mut remote, &sink).await;

        if let Err(e) = remote.close().await {
            tracing::debug!(error = %e, "Closing remote file failed");
        }

        match &result {
            Ok(outcome) => {
                let state = match outcome {
                    TransferOutcome::AlreadyComplete { .. } => TransferState::Skipped,
                    TransferOutcome::Completed { .. } => TransferState::Done,
                };
                self.set_state(state);
                sink.finished(outcome);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Transfer failed");
                self.set_state(TransferState::Failed);
            }
        }

        result
    }

    async fn transfer<R: RemoteSource>(
        &self,
        remote: &mut R,
        sink: &Arc<dyn ProgressSink>,
    ) -> Result<TransferOutcome> {
        self.set_state(TransferState::Planning);

        let remote_size = remote.stat_size().await.map_err(|source| Error::Stat {
            side: "remote",
            path: self.remote_label.clone(),
            source,
        })?;
        let local_size = file::local_size(&self.local_path).await?;
        let decision = plan(remote_size, local_size.is_some(), local_size.unwrap_or(0))?;

        tracing::debug!(
            remote_size,
            local_size = ?local_size,
            decision = ?decision,
            "Planned transfer"
        );

        let mut local = match decision {
            ResumeDecision::Complete => {
                tracing::info!(size = remote_size, "Local file already complete");
                return Ok(TransferOutcome::AlreadyComplete { size: remote_size });
            }
            ResumeDecision::Fresh => file::open_create(&self.local_path).await?,
            ResumeDecision::ResumeAt(offset) => {
                let local = file::open_append(&self.local_path).await?;
                seek_to(remote, offset).await?;
                tracing::info!(offset, "Resuming download");
                sink.resumed(offset);
                local
            }
        };

        self.set_state(TransferState::Transferring);
        let started = Instant::now();
        let reporter = ProgressReporter::spawn(
            self.local_path.clone(),
            remote_size,
            self.report_interval,
            Arc::clone(sink),
        );

        // The partial file is the resume state: pending writes must land on
        // disk before returning, on the error path too.
        let copied = copy_stream(remote, &mut local, self.chunk_size).await;
        let flushed = local.flush().await;
        drop(local);
        reporter.stop().await;

        let copied = match (copied, flushed) {
            (Ok(n), Ok(())) => Ok(n),
            (Ok(n), Err(source)) => Err(Error::Copy {
                transferred: n,
                source,
            }),
            (Err(e), flushed) => {
                if let Err(flush_err) = flushed {
                    tracing::warn!(error = %flush_err, "Flushing local file failed");
                }
                Err(e)
            }
        };

        let bytes_transferred = copied?;
        let offset = decision.offset();

        if offset + bytes_transferred != remote_size {
            tracing::warn!(
                expected = remote_size,
                actual = offset + bytes_transferred,
                "Remote stream ended at an unexpected size"
            );
        }

        Ok(TransferOutcome::Completed {
            bytes_transferred,
            resumed_from: offset,
            total: remote_size,
            elapsed: started.elapsed(),
        })
    }

    fn set_state(&self, state: TransferState) {
        tracing::debug!(state = ?state, "Transfer state");
        self.state_tx.send_replace(state);
    }
}

async fn seek_to<R>(remote: &mut R, offset: u64) -> Result<()>
where
    R: AsyncSeek + Unpin,
{
    let position = remote
        .seek(SeekFrom::Start(offset))
        .await
        .map_err(|source| Error::Seek { offset, source })?;

    if position != offset {
        return Err(Error::Seek {
            offset,
            source: io::Error::other(format!("stream positioned at {position}")),
        });
    }

    Ok(())
}

/// Copy `reader` into `writer` through a buffer of `chunk_size` bytes.
///
/// Returns the number of bytes copied.
async fn copy_stream<R, W>(reader: &mut R, writer: &mut W, chunk_size: usize) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; chunk_size];
    let mut transferred = 0u64;

    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|source| Error::Copy {
                transferred,
                source,
            })?;

        if n == 0 {
            return Ok(transferred);
        }

        writer
            .write_all(&buf[..n])
            .await
            .map_err(|source| Error::Copy {
                transferred,
                source,
            })?;

        transferred += n as u64;
    }
}
