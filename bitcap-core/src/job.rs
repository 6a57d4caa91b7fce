// ============================================================================
// bitcap-core/src/job.rs
// ============================================================================
//
// TRANSCODE JOB: Decision and Download/Transcode/Upload Cycle
//
// For one object: probe its bitrate, decide whether it needs re-encoding,
// and if so download it, transcode it, and upload the result over the same
// key. Every failure is caught here and turned into an `ObjectOutcome`;
// nothing escapes to the folder loop. Scratch files are owned by a
// `ScratchPaths` guard and removed however the job ends.
//
// AI-ASSISTANT-INFO: Per-object decision pipeline and in-place replacement

use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::external::{FfmpegSpawner, FfprobeExecutor};
use crate::probe::{BitrateProbe, probe_bitrate};
use crate::progress::ProgressReporter;
use crate::reporting::{JobStage, ObjectOutcome, format_bitrate};
use crate::runner::{TranscodeRequest, run_transcode};
use crate::storage::ObjectStore;
use crate::temp_files::ScratchPaths;

/// Everything a batch needs, borrowed for its duration.
pub struct BatchContext<'a, St: ?Sized, Pr: ?Sized, Sp> {
    pub config: &'a CoreConfig,
    pub store: &'a St,
    pub prober: &'a Pr,
    pub spawner: &'a Sp,
    pub reporter: &'a dyn ProgressReporter,
}

/// What to do with an object whose bitrate is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeDecision {
    BelowThreshold,
    DryRun,
    Transcode,
}

/// Over the threshold (strictly) means transcode, unless dry-run is set.
pub fn decide(bitrate: u64, config: &CoreConfig) -> TranscodeDecision {
    if bitrate <= config.bitrate_threshold {
        TranscodeDecision::BelowThreshold
    } else if config.dry_run {
        TranscodeDecision::DryRun
    } else {
        TranscodeDecision::Transcode
    }
}

/// A job step failed.
#[derive(Debug)]
pub struct JobFailure {
    pub stage: JobStage,
    pub error: CoreError,
}

impl JobFailure {
    fn at(stage: JobStage) -> impl FnOnce(CoreError) -> Self {
        move |error| Self { stage, error }
    }
}

/// Downloads `key`, re-encodes it and uploads the result over `key`.
///
/// The upload only runs after a successful transcode. Both scratch files
/// are gone when this returns.
pub fn execute_job<St, Pr, Sp>(ctx: &BatchContext<'_, St, Pr, Sp>, key: &str) -> Result<(), JobFailure>
where
    St: ObjectStore + ?Sized,
    Pr: FfprobeExecutor + ?Sized,
    Sp: FfmpegSpawner,
{
    let scratch = ScratchPaths::for_key(&ctx.config.scratch_dir, key)
        .map_err(JobFailure::at(JobStage::Download))?;

    log::debug!("Downloading {} to {}", key, scratch.download().display());
    ctx.store
        .download(key, scratch.download())
        .map_err(JobFailure::at(JobStage::Download))?;

    let request = TranscodeRequest::from_config(ctx.config, scratch.download(), scratch.output());
    run_transcode(ctx.spawner, &request, ctx.reporter).map_err(JobFailure::at(JobStage::Transcode))?;

    log::debug!("Uploading {} over {}", scratch.output().display(), key);
    ctx.store
        .upload(scratch.output(), key)
        .map_err(JobFailure::at(JobStage::Upload))?;

    Ok(())
}

/// Probes, decides, and (when needed) transcodes one object.
///
/// Never fails: every error is logged with the key and reported as an
/// outcome.
pub fn process_object<St, Pr, Sp>(ctx: &BatchContext<'_, St, Pr, Sp>, key: &str) -> ObjectOutcome
where
    St: ObjectStore + ?Sized,
    Pr: FfprobeExecutor + ?Sized,
    Sp: FfmpegSpawner,
{
    let bitrate = match probe_bitrate(ctx.prober, ctx.config, key) {
        Ok(BitrateProbe::Available(bps)) => bps,
        Ok(BitrateProbe::NoBitrateAvailable(reason)) => {
            log::info!("Skipping {}: {}", key, reason);
            return ObjectOutcome::NoBitrate(reason);
        }
        Err(e) => {
            log::warn!("Skipping {}: {}", key, e);
            return ObjectOutcome::ProbeFailed(e.to_string());
        }
    };

    let threshold = format_bitrate(ctx.config.bitrate_threshold);
    match decide(bitrate, ctx.config) {
        TranscodeDecision::BelowThreshold => {
            log::info!(
                "{}: {} is within the {} threshold, leaving it",
                key,
                format_bitrate(bitrate),
                threshold
            );
            ObjectOutcome::BelowThreshold { bitrate }
        }
        TranscodeDecision::DryRun => {
            log::info!(
                "[dry-run] {}: {} exceeds {}, would re-encode to {}",
                key,
                format_bitrate(bitrate),
                threshold,
                format_bitrate(ctx.config.target_bitrate)
            );
            ObjectOutcome::DryRun { bitrate }
        }
        TranscodeDecision::Transcode => {
            log::info!(
                "{}: {} exceeds {}, re-encoding to {}",
                key,
                format_bitrate(bitrate),
                threshold,
                format_bitrate(ctx.config.target_bitrate)
            );
            match execute_job(ctx, key) {
                Ok(()) => {
                    log::info!("{}: replaced with re-encoded version", key);
                    ObjectOutcome::Transcoded { bitrate }
                }
                Err(JobFailure { stage, error }) => {
                    log::error!("{}: {} failed: {}", key, stage, error.summary());
                    if let CoreError::TranscodeFailed { stderr, .. } = &error {
                        if !stderr.is_empty() {
                            log::error!("ffmpeg output for {}:\n{}", key, stderr.trim_end());
                        }
                    }
                    ObjectOutcome::Failed {
                        stage,
                        message: error.summary(),
                    }
                }
            }
        }
    }
}
