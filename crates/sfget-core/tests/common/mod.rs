//! Common test utilities for sfget integration tests.
//!
//! In-memory remote files with knobs for the failure modes a real SFTP
//! stream can show, plus a sink that records everything it is told.

#![allow(dead_code)]

use std::io::{self, Read, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use sfget_core::transfer::{ProgressSample, ProgressSink, RemoteSource, TransferOutcome};

/// Create a temporary directory for test files.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Path of the download target inside `dir`.
pub fn local_target(dir: &Path) -> PathBuf {
    dir.join("download.bin")
}

/// Generate random bytes for testing.
pub fn random_bytes(size: usize) -> Vec<u8> {
    use rand::RngCore;
    let mut bytes = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Remote file backed by memory.
///
/// Can be told to break the stream at an absolute offset, to refuse a stat
/// or a seek, and counts every byte handed out.
pub struct MemoryRemote {
    inner: io::Cursor<Vec<u8>>,
    fail_at: Option<u64>,
    fail_stat: bool,
    fail_seek: bool,
    bytes_read: Arc<AtomicU64>,
    closed: Arc<AtomicU64>,
}

impl MemoryRemote {
    /// A well-behaved remote file.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            inner: io::Cursor::new(data),
            fail_at: None,
            fail_stat: false,
            fail_seek: false,
            bytes_read: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Reads fail with `ConnectionReset` once the stream reaches `offset`.
    #[must_use]
    pub fn failing_at(mut self, offset: u64) -> Self {
        self.fail_at = Some(offset);
        self
    }

    /// `stat_size` fails.
    #[must_use]
    pub fn failing_stat(mut self) -> Self {
        self.fail_stat = true;
        self
    }

    /// Every seek fails.
    #[must_use]
    pub fn failing_seek(mut self) -> Self {
        self.fail_seek = true;
        self
    }

    /// Shared counter of bytes returned by reads.
    pub fn bytes_read(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.bytes_read)
    }

    /// Shared counter of `close` calls.
    pub fn close_count(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.closed)
    }
}

impl AsyncRead for MemoryRemote {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let position = this.inner.position();

        let limit = match this.fail_at {
            Some(fail_at) if position >= fail_at => {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )));
            }
            Some(fail_at) => usize::try_from(fail_at - position)
                .unwrap_or(usize::MAX)
                .min(buf.remaining()),
            None => buf.remaining(),
        };

        let mut chunk = vec![0u8; limit];
        let n = this.inner.read(&mut chunk)?;
        buf.put_slice(&chunk[..n]);
        this.bytes_read.fetch_add(n as u64, Ordering::SeqCst);

        Poll::Ready(Ok(()))
    }
}

impl AsyncSeek for MemoryRemote {
    fn start_seek(self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        let this = self.get_mut();
        if this.fail_seek {
            return Err(io::Error::other("seek refused"));
        }
        Pin::new(&mut this.inner).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.get_mut().inner).poll_complete(cx)
    }
}

impl RemoteSource for MemoryRemote {
    async fn stat_size(&mut self) -> io::Result<u64> {
        if self.fail_stat {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        Ok(self.inner.get_ref().len() as u64)
    }

    async fn close(&mut self) -> io::Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sink that records every event.
#[derive(Default)]
pub struct RecordingSink {
    pub samples: Mutex<Vec<ProgressSample>>,
    pub resumed: Mutex<Vec<u64>>,
    pub finished: Mutex<Vec<TransferOutcome>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl ProgressSink for RecordingSink {
    fn sample(&self, sample: &ProgressSample) {
        self.samples.lock().unwrap().push(*sample);
    }

    fn resumed(&self, offset: u64) {
        self.resumed.lock().unwrap().push(offset);
    }

    fn finished(&self, outcome: &TransferOutcome) {
        self.finished.lock().unwrap().push(*outcome);
    }
}

/// Assert that the local file holds exactly `expected`.
pub fn assert_file_bytes(path: &Path, expected: &[u8]) {
    let actual = std::fs::read(path).expect("Failed to read local file");
    assert_eq!(actual.len(), expected.len(), "File sizes differ");
    assert!(actual == expected, "File contents differ");
}
