// bitcap-cli/src/commands/preflight.rs
//
// Stand-alone preflight: transcode a local sample with the batch settings.

use crate::cli::PreflightArgs;
use crate::error::CliResult;
use bitcap_core::{CoreConfig, SidecarSpawner, TerminalProgress, format_bitrate, run_preflight};

pub fn run_preflight_command(args: &PreflightArgs, config: &CoreConfig) -> CliResult<()> {
    config.validate_transcode()?;
    log::info!(
        "Transcoding '{}' at {} with {}",
        args.sample.display(),
        format_bitrate(config.target_bitrate),
        config.ffmpeg_path.display()
    );
    run_preflight(&SidecarSpawner, &TerminalProgress::new(), config, &args.sample)
}
