//! CLI argument definitions and handlers.

use std::path::PathBuf;

use clap::Parser;

use sfget_core::config::{Config, DownloadRequest};

pub mod download;

/// Load the defaults file, from `path` when given.
///
/// A missing file yields the built-in defaults; a broken one is an error so
/// that a typo in it does not silently change the download.
pub fn load_config(path: Option<&std::path::Path>) -> sfget_core::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// sfget - resume and complete the download of a single file over SFTP
///
/// Running the same command again after an interruption continues from the
/// end of the partial local file.
#[derive(Parser, Debug)]
#[command(name = "sfget")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Remote host (HOST or HOST:PORT)
    #[arg(short = 'H', long, visible_short_alias = 'h', visible_alias = "h")]
    pub host: Option<String>,

    /// Remote SSH user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password of the remote user
    #[arg(short, long, env = "SFGET_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Remote file (absolute path)
    #[arg(short, long = "remote-file", visible_alias = "rf")]
    pub remote_file: Option<String>,

    /// Local file (absolute path)
    #[arg(short, long = "local-file", visible_alias = "lf")]
    pub local_file: Option<PathBuf>,

    /// Seconds between two progress lines [default: 1]
    #[arg(short, long)]
    pub secs: Option<u64>,

    /// Connection timeout in seconds [default: 10]
    #[arg(short, long, visible_alias = "to")]
    pub timeout: Option<u64>,

    /// Copy buffer size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Defaults file to use instead of the platform one
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Detailed logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    pub help: Option<bool>,
}

impl Cli {
    /// Per-run parameters for config resolution.
    pub fn request(&self) -> DownloadRequest {
        DownloadRequest {
            host: self.host.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            remote_path: self.remote_file.clone(),
            local_path: self.local_file.clone(),
            report_interval_secs: self.secs,
            timeout_secs: self.timeout,
            chunk_size: self.chunk_size,
        }
    }
}
