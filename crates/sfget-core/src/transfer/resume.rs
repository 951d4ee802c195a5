//! Resume planning for interrupted downloads.
//!
//! A previous run leaves behind a local file holding a prefix of the remote
//! file. Comparing its size with the remote size is all that is needed to
//! decide where the next run starts; no side-car state is kept.

use crate::error::{Error, Result};

/// What to do with the local file before copying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    /// Local file already has every byte; nothing to transfer.
    Complete,
    /// Local file holds a prefix of this many bytes; append from there.
    ResumeAt(u64),
    /// No local file; create it and start from zero.
    Fresh,
}

impl ResumeDecision {
    /// Byte offset the copy starts from.
    #[must_use]
    pub const fn offset(self) -> u64 {
        match self {
            Self::ResumeAt(offset) => offset,
            Self::Complete | Self::Fresh => 0,
        }
    }
}

/// Decide how to continue a download.
///
/// `local_size` is ignored when `local_exists` is false.
///
/// # Errors
///
/// Returns [`Error::LocalLargerThanRemote`] when the local file is bigger than
/// the remote one. Such a file is either unrelated or the remote shrank;
/// neither truncating nor appending to it would give a correct result.
pub fn plan(remote_size: u64, local_exists: bool, local_size: u64) -> Result<ResumeDecision> {
    if !local_exists {
        return Ok(ResumeDecision::Fresh);
    }

    match local_size.cmp(&remote_size) {
        std::cmp::Ordering::Equal => Ok(ResumeDecision::Complete),
        std::cmp::Ordering::Less => Ok(ResumeDecision::ResumeAt(local_size)),
        std::cmp::Ordering::Greater => Err(Error::LocalLargerThanRemote {
            local: local_size,
            remote: remote_size,
        }),
    }
}
