//! Error types for sfget.
//!
//! Every fatal condition of a download maps onto one variant here, so the
//! CLI can pick an exit code and tests can assert on the failure category
//! without matching on message strings.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A specialized `Result` type for sfget operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure category, one per stage of a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or unparseable parameter, reported before any I/O.
    Config,
    /// Remote session could not be established.
    Connection,
    /// Remote or local metadata could not be read, or the sizes disagree.
    Stat,
    /// Remote stream could not be positioned or local file could not be opened.
    SeekOrOpen,
    /// Failure in the middle of the byte stream.
    Copy,
}

/// The main error type for sfget.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid user input (host strings and the like)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Remote session could not be established
    #[error("connection to {host} failed: {reason}")]
    Connection {
        /// Host as given by the user
        host: String,
        /// Underlying cause
        reason: String,
    },

    /// Server rejected the credentials
    #[error("authentication failed for user '{0}'")]
    AuthenticationFailed(String),

    /// Operation timeout
    #[error("operation timed out after {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    /// Remote or local metadata could not be read
    #[error("cannot stat {side} file '{path}': {source}")]
    Stat {
        /// "remote" or "local"
        side: &'static str,
        /// Path whose metadata was read
        path: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Local file is bigger than the remote one
    #[error("local file is larger than remote file ({local} > {remote} bytes)")]
    LocalLargerThanRemote {
        /// Local size in bytes
        local: u64,
        /// Remote size in bytes
        remote: u64,
    },

    /// Remote stream could not be positioned
    #[error("cannot seek remote file to offset {offset}: {source}")]
    Seek {
        /// Requested offset
        offset: u64,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Local file could not be opened in the chosen mode
    #[error("cannot open local file '{}': {source}", path.display())]
    Open {
        /// Local path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Byte stream failed partway through
    #[error("transfer failed after {transferred} bytes: {source}")]
    Copy {
        /// Bytes written to the local file during this run before the failure
        transferred: u64,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Returns the stage this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::InvalidConfig { .. } | Self::InvalidInput(_) => {
                ErrorCategory::Config
            }
            Self::Connection { .. } | Self::AuthenticationFailed(_) | Self::Timeout(_) => {
                ErrorCategory::Connection
            }
            Self::Stat { .. } | Self::LocalLargerThanRemote { .. } => ErrorCategory::Stat,
            Self::Seek { .. } | Self::Open { .. } => ErrorCategory::SeekOrOpen,
            Self::Copy { .. } => ErrorCategory::Copy,
        }
    }

    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Config => 2,
            ErrorCategory::Connection => 3,
            ErrorCategory::Stat => 4,
            ErrorCategory::SeekOrOpen => 5,
            ErrorCategory::Copy => 6,
        }
    }

    /// Returns a helpful suggestion for resolving the error, if applicable.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::LocalLargerThanRemote { .. } => Some(
                "The local copy does not belong to this remote file.\n\
                 Move or delete it, then run the download again.",
            ),
            Self::Copy { .. } => Some(
                "The partial file has been kept.\n\
                 Run the same command again to resume from where it stopped.",
            ),
            Self::AuthenticationFailed(_) => {
                Some("Check the user name and password (or SFGET_PASSWORD).")
            }
            Self::Timeout(_) => Some("Check the host address, or raise --timeout."),
            _ => None,
        }
    }
}
