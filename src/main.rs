//! cpb - C Project Builder
//!
//! A thin front end over CMake: reads `buildsettings.json`, then configures,
//! builds or cleans the project it describes.
//!
//! ## Architecture
//!
//! ```text
//! cli.rs → config/ (settings) → build/cmake.rs → exec/subprocess.rs → cmake
//! ```

mod build;
mod cli;
mod config;
mod error;
mod exec;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Intent, Outcome, PROGRAM_NAME};
use error::BuilderError;
use utils::terminal::{format_size, print_error, print_status};

fn main() -> ExitCode {
    let intent = Intent::from_cli(Cli::parse());
    init_logging(intent.debug);

    match cli::execute(&intent) {
        Ok(outcome) => {
            if let Outcome::Cleaned(report) = &outcome {
                debug!("removed {} files ({})", report.files, format_size(report.bytes));
            }
            print_status(&outcome.to_string());
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let Some(hint) = err.downcast_ref::<BuilderError>().and_then(BuilderError::hint) {
                debug!("hint: {}", hint);
            }
            print_error(PROGRAM_NAME, &err.to_string());
            ExitCode::FAILURE
        }
    }
}

/// `--debug` sends debug logs to stdout; otherwise only warnings reach stderr.
/// `RUST_LOG` overrides the level either way.
fn init_logging(debug: bool) {
    let default_filter = if debug { "cpb=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if debug {
        builder
            .with_ansi(console::colors_enabled())
            .with_writer(std::io::stdout)
            .init();
    } else {
        builder
            .with_ansi(console::colors_enabled_stderr())
            .with_writer(std::io::stderr)
            .init();
    }
}
