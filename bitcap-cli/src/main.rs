// bitcap-cli/src/main.rs
//
// Entry point for the `bitcap` binary.
//
// Responsibilities:
// - Parsing command-line arguments.
// - Setting up console and file logging.
// - Resolving the configuration for the chosen subcommand.
// - Dispatching to the command implementation and mapping its result to the
//   process exit code.

use bitcap_cli::{
    Cli, CliResult, Commands, batch_exit_code, init_logging, resolve_config,
    run_batch, run_preflight_command, run_probe,
};
use clap::Parser;
use console::style;
use std::process;

fn main() {
    let cli = Cli::parse();

    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            1
        }
    };
    process::exit(code);
}

fn dispatch(cli: Cli) -> CliResult<i32> {
    if let Some(path) = init_logging(cli.verbose, cli.log_dir.as_deref())? {
        log::info!("Logging to {}", path.display());
    }
    let config_file = cli.config.as_deref();

    match &cli.command {
        Commands::Run(args) => {
            let config = resolve_config(config_file, |b| args.apply(b))?;
            let summary = run_batch(args, &config)?;
            Ok(batch_exit_code(&summary, args.fail_on_error))
        }
        Commands::Preflight(args) => {
            let config = resolve_config(config_file, |b| args.apply(b))?;
            run_preflight_command(args, &config)?;
            Ok(0)
        }
        Commands::Probe(args) => {
            let config = resolve_config(config_file, |b| args.apply(b))?;
            let failures = run_probe(args, &config)?;
            Ok(if failures > 0 { 1 } else { 0 })
        }
    }
}
