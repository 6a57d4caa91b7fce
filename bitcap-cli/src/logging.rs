// ============================================================================
// bitcap-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and File Logging for the CLI
//
// Installs a `fern` dispatcher behind the `log` facade. Console lines carry a
// coloured, padded level tag; the optional log file gets plain timestamped
// lines. Only bitcap's own crates log below WARN.
//
// KEY COMPONENTS:
// - Timestamp generation for log file names
// - init_logging: console + optional `bitcap_run_<timestamp>.log`

use crate::error::{CliErrorContext, CliResult};
use bitcap_core::CoreError;
use console::style;
use log::{Level, LevelFilter};
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Name of the run log written into `--log-dir`.
pub fn log_file_name(timestamp: &str) -> String {
    format!("bitcap_run_{timestamp}.log")
}

fn level_tag(level: Level) -> String {
    let padded = format!("{:<5}", level.as_str());
    match level {
        Level::Error => style(padded).red().bold().to_string(),
        Level::Warn => style(padded).yellow().bold().to_string(),
        Level::Info => style(padded).green().to_string(),
        Level::Debug => style(padded).blue().to_string(),
        Level::Trace => style(padded).magenta().to_string(),
    }
}

/// Initializes logging for the process.
///
/// Returns the path of the log file when `log_dir` is given.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{} {}", level_tag(record.level()), message))
        })
        .chain(std::io::stdout());

    let mut root = fern::Dispatch::new()
        .level(LevelFilter::Warn)
        .level_for("bitcap_core", level)
        .level_for("bitcap_cli", level)
        .level_for("bitcap", level)
        .chain(console);

    let mut log_path = None;
    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)
            .cli_with_context(|| format!("Creating log directory '{}'", dir.display()))?;
        let path = dir.join(log_file_name(&get_timestamp()));
        let file = fern::log_file(&path)
            .cli_with_context(|| format!("Opening log file '{}'", path.display()))?;

        root = root.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} [{}] {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        message
                    ))
                })
                .chain(file),
        );
        log_path = Some(path);
    }

    root.apply()
        .map_err(|e| CoreError::OperationFailed(format!("Cannot install logger: {e}")))?;
    Ok(log_path)
}
