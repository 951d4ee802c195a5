//! sfget CLI - resumable single-file SFTP downloads
//!
//! ## Quick Start
//!
//! ```bash
//! sfget -H files.example.com -u alice -p secret \
//!     --remote-file /srv/images/disk.iso --local-file /tmp/disk.iso
//!
//! # Interrupted? Run the same command again to continue.
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

use std::process::ExitCode;

use clap::Parser;

mod commands;
pub mod ui;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match commands::download::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);

            let core_error = e.downcast_ref::<sfget_core::Error>();
            if let Some(hint) = core_error.and_then(sfget_core::Error::suggestion) {
                eprintln!();
                eprintln!("{}", hint);
            }

            let code = core_error.map_or(1, sfget_core::Error::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

/// Log filter used when `RUST_LOG` is not set.
const fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,sfget=debug,sfget_core=debug"
    } else {
        "warn,sfget=info,sfget_core=info"
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
