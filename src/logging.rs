//! Tracing setup: console output plus a per-stage log file in `Logs/`.

use std::path::Path;

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise `info` (or `debug`
/// when `verbose`). With `file` set to `(dir, stem)`, events are also written
/// without ANSI colors to `dir/stem.log`. The returned guard flushes that
/// file when dropped, so callers hold it for the life of the command.
///
/// Installing twice in one process is a no-op.
pub fn init(verbose: bool, file: Option<(&Path, &str)>) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let mut open_error = None;
    let (file_layer, guard) = match file.map(|(dir, stem)| open_log(dir, stem)) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(false);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            open_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .is_ok();

    if let (Some(e), Some((dir, stem))) = (open_error, file) {
        let path = dir.join(format!("{stem}.log"));
        warn!(file = %path.display(), error = %e, "log file unavailable, logging to console only");
    }
    if installed {
        guard
    } else {
        None
    }
}

fn open_log(
    dir: &Path,
    stem: &str,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(stem)
        .filename_suffix("log")
        .build(dir)
}
