//! Command dispatch and handlers.

pub mod reason;
pub mod status;
pub mod watch;

use tracing_appender::non_blocking::WorkerGuard;

use crate::cli::{Cli, Command, VaultArgs};
use crate::config::VaultConfig;
use crate::context::ServiceContext;
use crate::logging;
use crate::vault::Vault;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Command::Watch { vault, interval, once } => {
            watch::run(vault, cli.verbose, *interval, *once)
        }
        Command::Reason { vault, file } => reason::run(vault, cli.verbose, file.as_deref()),
        Command::Status { vault, json } => status::run(vault, *json),
    }
}

/// Everything a stage command needs once the vault is ready.
pub(crate) struct Session {
    pub ctx: ServiceContext,
    pub vault: Vault,
    pub config: VaultConfig,
    _log_guard: Option<WorkerGuard>,
}

impl Session {
    /// Starts logging to the console and `Logs/<log_stem>.log`, then creates
    /// the vault layout and loads `vault.yaml`.
    pub(crate) fn open(args: &VaultArgs, verbose: bool, log_stem: &str) -> Result<Self, String> {
        let vault = Vault::new(args.vault.clone());
        let logs = vault.logs();
        let guard = logging::init(verbose, Some((logs.as_path(), log_stem)));
        let ctx = ServiceContext::live(&vault);
        vault.ensure_layout(ctx.fs.as_ref()).map_err(|e| e.to_string())?;
        let config = VaultConfig::load(ctx.fs.as_ref(), &vault).map_err(|e| e.to_string())?;
        Ok(Self { ctx, vault, config, _log_guard: guard })
    }
}
