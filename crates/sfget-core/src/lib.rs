//! # sfget Core Library
//!
//! `sfget-core` downloads a single file over SFTP and picks up where a
//! previous, interrupted run left off. The partially written local file is
//! the only resume state: its size is the offset the next run continues from.
//!
//! ## Modules
//!
//! - [`config`] - Configuration defaults file and the validated download config
//! - [`connection`] - Host parsing and the SSH/SFTP connector
//! - [`error`] - Error taxonomy and exit codes
//! - [`mod@file`] - Size formatting and local file access
//! - [`transfer`] - Resume planning, progress reporting and the transfer engine
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfget_core::config::DownloadConfig;
//! use sfget_core::connection::SftpConnector;
//! use sfget_core::transfer::TransferEngine;
//!
//! let remote = SftpConnector::new(&config).connect().await?;
//! let outcome = TransferEngine::from_config(&config).run(remote, sink).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod connection;
pub mod error;
pub mod file;
pub mod transfer;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default progress report interval in seconds
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 1;

/// Default connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default copy buffer size (32 KB)
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;
