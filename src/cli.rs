//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `taskvault`.
#[derive(Debug, Parser)]
#[command(name = "taskvault", version, about = "Turn dropped files into tracked tasks")]
pub struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Location of the vault, shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct VaultArgs {
    /// Vault root directory.
    #[arg(long, env = "TASKVAULT_ROOT", default_value = ".")]
    pub vault: PathBuf,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the inbox and turn new files into pending tasks.
    Watch {
        #[command(flatten)]
        vault: VaultArgs,
        /// Seconds between scans (overrides `vault.yaml`).
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
        /// Run a single scan cycle and exit.
        #[arg(long)]
        once: bool,
    },
    /// Evaluate pending tasks and complete or flag them.
    Reason {
        #[command(flatten)]
        vault: VaultArgs,
        /// Only process this file in `Needs_Action`.
        #[arg(long, value_name = "NAME")]
        file: Option<String>,
    },
    /// Show folder counts and the status of every open task.
    Status {
        #[command(flatten)]
        vault: VaultArgs,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn parses_watch_subcommand() {
        let cli =
            Cli::parse_from(["taskvault", "watch", "--vault", "/v", "--interval", "3", "--once"]);
        match cli.command {
            Command::Watch { vault, interval, once } => {
                assert_eq!(vault.vault, Path::new("/v"));
                assert_eq!(interval, Some(3));
                assert!(once);
            }
            other => panic!("expected Watch, got {other:?}"),
        }
    }

    #[test]
    fn parses_reason_with_file() {
        let cli = Cli::parse_from(["taskvault", "reason", "--file", "todo_processed.md"]);
        assert!(matches!(
            cli.command,
            Command::Reason { file: Some(ref f), .. } if f == "todo_processed.md"
        ));
    }

    #[test]
    fn parses_status_json_with_global_verbose() {
        let cli = Cli::parse_from(["taskvault", "status", "--json", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Status { json: true, .. }));
    }

    #[test]
    fn rejects_non_numeric_interval() {
        assert!(Cli::try_parse_from(["taskvault", "watch", "--interval", "soon"]).is_err());
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(Cli::try_parse_from(["taskvault"]).is_err());
    }
}
