// bitcap-cli/src/lib.rs
//
// Library portion of the Bitcap CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, PreflightArgs, ProbeArgs, RunArgs};
pub use commands::preflight::run_preflight_command;
pub use commands::probe::run_probe;
pub use commands::run::{batch_exit_code, run_batch};
pub use config::resolve_config;
pub use error::{CliErrorContext, CliResult};
pub use logging::init_logging;
