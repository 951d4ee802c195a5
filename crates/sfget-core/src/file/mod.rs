//! Local file access and size formatting.
//!
//! The local file is both the download target and the resume state: its
//! length is the offset a later run continues from. The helpers here are the
//! only places that stat or open it.

use std::io;
use std::path::Path;

use tokio::fs::{File, OpenOptions};

use crate::error::{Error, Result};

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "EB"];

/// Format a byte count for display, always with two decimals.
///
/// Each unit step is 1024. The ladder ends at `EB` directly after `TB`, so
/// anything from 1024 TB upwards is shown in `EB`.
///
/// ```
/// use sfget_core::file::format_size;
///
/// assert_eq!(format_size(512), "512.00B");
/// assert_eq!(format_size(1536), "1.50KB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    let mut unit = 0;
    let mut scale: u64 = 1;

    while unit < UNITS.len() - 1 && bytes / scale >= 1024 {
        scale *= 1024;
        unit += 1;
    }

    format!("{:.2}{}", bytes as f64 / scale as f64, UNITS[unit])
}

/// Size of the local file, or `None` when it does not exist.
///
/// # Errors
///
/// Returns [`Error::Stat`] for any failure other than "not found".
pub async fn local_size(path: &Path) -> Result<Option<u64>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Stat {
            side: "local",
            path: path.display().to_string(),
            source: e,
        }),
    }
}

/// Create (or truncate) the local file for a fresh download.
///
/// # Errors
///
/// Returns [`Error::Open`] if the file cannot be created.
pub async fn open_create(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Open an existing partial file so that writes land at its end.
///
/// # Errors
///
/// Returns [`Error::Open`] if the file cannot be opened, including when it
/// vanished since it was sized.
pub async fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })
}
