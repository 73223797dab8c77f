//! Entry point for the `musterd` daemon.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use musterd::{Cli, run};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed yet, so report directly.
            writeln!(io::stderr(), "musterd: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
