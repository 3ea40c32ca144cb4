//! Core library entry for the `taskvault` CLI.
//!
//! Files dropped into a vault's `Inbox/` become task records in
//! `Needs_Action/`; a policy check then completes each record into `Done/`
//! or flags it for human approval.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod naming;
pub mod pipeline;
pub mod policy;
pub mod ports;
pub mod task;
pub mod vault;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
