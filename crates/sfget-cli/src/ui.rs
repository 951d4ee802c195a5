//! Console output for sfget.
//!
//! These lines are meant for people, not scripts; their wording may change.

use std::path::PathBuf;
use std::time::Duration;

use sfget_core::file::format_size;
use sfget_core::transfer::{ProgressSample, ProgressSink, TransferOutcome};

/// Prints download events to stdout.
pub struct ConsoleSink {
    local_path: PathBuf,
    quiet: bool,
}

impl ConsoleSink {
    /// Create a sink. With `quiet`, only the final line is printed.
    #[must_use]
    pub const fn new(local_path: PathBuf, quiet: bool) -> Self {
        Self { local_path, quiet }
    }
}

impl ProgressSink for ConsoleSink {
    fn sample(&self, sample: &ProgressSample) {
        if !self.quiet {
            println!("{sample}");
        }
    }

    fn resumed(&self, offset: u64) {
        if !self.quiet {
            println!("{}", resume_line(&self.local_path, offset));
        }
    }

    fn finished(&self, outcome: &TransferOutcome) {
        println!("{}", outcome_line(outcome));
    }
}

fn resume_line(path: &std::path::Path, offset: u64) -> String {
    format!(
        "local file {} exists, offset {} ({}), resuming download ...",
        path.display(),
        offset,
        format_size(offset)
    )
}

fn outcome_line(outcome: &TransferOutcome) -> String {
    match *outcome {
        TransferOutcome::AlreadyComplete { size } => {
            format!("download already complete ({})", format_size(size))
        }
        TransferOutcome::Completed {
            bytes_transferred,
            elapsed,
            ..
        } => format!(
            "download complete: {} in {}, {}/s",
            format_size(bytes_transferred),
            format_elapsed(elapsed),
            format_size(average_rate(bytes_transferred, elapsed))
        ),
    }
}

/// Format a duration as "Hh MMm SSs", dropping leading zero units.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}.{:01}s", secs, elapsed.subsec_millis() / 100)
    }
}

/// Bytes per second over the whole copy.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn average_rate(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return bytes;
    }
    (bytes as f64 / secs) as u64
}
