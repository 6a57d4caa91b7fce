// ============================================================================
// bitcap-cli/src/commands/run.rs
// ============================================================================
//
// RUN COMMAND: Batch Bitrate Normalization
//
// Resolves the configuration, checks the external tools, optionally runs the
// preflight transcode, then walks every configured folder. Object and folder
// failures are reported in the summary; only setup problems (configuration,
// missing tools, failed preflight, S3 client) abort the command.

use crate::cli::RunArgs;
use crate::error::{CliErrorContext, CliResult};
use bitcap_core::{
    BatchContext, BatchSummary, CoreConfig, CrateFfprobeExecutor, S3ObjectStore, SidecarSpawner,
    TerminalProgress, check_dependency, format_bitrate, format_duration, process_folders,
    run_preflight,
};
use std::time::Instant;

/// Runs the batch and returns its summary.
pub fn run_batch(args: &RunArgs, config: &CoreConfig) -> CliResult<BatchSummary> {
    let started = Instant::now();
    config.validate()?;

    check_dependency(&config.ffprobe_path)?;
    let preflight_sample = if args.skip_preflight {
        None
    } else {
        config.preflight_sample.as_deref()
    };
    if !config.dry_run || preflight_sample.is_some() {
        check_dependency(&config.ffmpeg_path)?;
    }

    log_header(config);

    let progress = TerminalProgress::new();
    if let Some(sample) = preflight_sample {
        run_preflight(&SidecarSpawner, &progress, config, sample)
            .cli_context("Preflight transcode failed; batch not started")?;
    } else if args.skip_preflight && config.preflight_sample.is_some() {
        log::info!("Preflight skipped by request");
    }

    let store = S3ObjectStore::from_config(config).cli_context("Setting up the S3 client")?;
    let prober = CrateFfprobeExecutor::new(&config.ffprobe_path, config.probe_timeout_secs);

    let ctx = BatchContext {
        config,
        store: &store,
        prober: &prober,
        spawner: &SidecarSpawner,
        reporter: &progress,
    };
    let summary = process_folders(&ctx);

    log::info!(
        "Total time: {}",
        format_duration(started.elapsed().as_secs_f64())
    );
    Ok(summary)
}

fn log_header(config: &CoreConfig) {
    log::info!(
        "Bucket '{}', prefix '{}', {} folder(s)",
        config.bucket,
        config.scan_prefix,
        config.folders.len()
    );
    log::info!(
        "Threshold {}, target {}, extensions [{}]",
        format_bitrate(config.bitrate_threshold),
        format_bitrate(config.target_bitrate),
        config.extensions.join(", ")
    );
    if config.dry_run {
        log::info!("DRY RUN: objects are probed and reported, nothing is replaced");
    }
}

/// Process exit code for a finished batch.
///
/// A batch that ran to the end exits 0 unless `fail_on_error` asks for
/// object and folder failures to be reflected.
pub fn batch_exit_code(summary: &BatchSummary, fail_on_error: bool) -> i32 {
    if fail_on_error && summary.has_failures() {
        1
    } else {
        0
    }
}
