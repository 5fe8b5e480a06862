//! sdkref CLI entry point.
//!
//! Runs the generator and maps failures to semantic exit codes (see
//! [`sdkref_cli::error`]).

use colored::Colorize;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match sdkref_cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(sdkref_cli::error::exit_code_from_error(&err))
        },
    }
}
