//! Binary entrypoint for the `taskvault` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match taskvault::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
