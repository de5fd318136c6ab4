//! `plastic` renders an HTML template with record data into a PDF and either
//! submits it to the system print spooler, saves it to a file, or writes it to
//! standard output.
//!
//! Results and errors are reported on stdout in the format chosen with
//! `--format` (`log` or `json`); diagnostic logs go to stderr.

mod cli;
mod commands;
mod dispatch;
mod error;
mod output;

use crate::cli::Cli;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    commands::run(cli).await
}

fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
