//! Local smoke test of the transcode toolchain.
//!
//! Before touching the bucket, a local sample can be re-encoded with the
//! production parameters to confirm that the configured ffmpeg works. The
//! output lands in `<scratch>/test_output_<base>` and is always removed.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::FfmpegSpawner;
use crate::progress::ProgressReporter;
use crate::runner::{TranscodeRequest, run_transcode};
use crate::temp_files::{PREFLIGHT_PREFIX, ScratchFile};
use std::path::Path;

/// Transcodes `sample` into the scratch directory and discards the result.
///
/// A missing sample is a `Preflight` error; a failed transcode comes back as
/// `TranscodeFailed` with ffmpeg's diagnostic text.
pub fn run_preflight<S, R>(
    spawner: &S,
    reporter: &R,
    config: &CoreConfig,
    sample: &Path,
) -> CoreResult<()>
where
    S: FfmpegSpawner,
    R: ProgressReporter + ?Sized,
{
    log::info!("Preflight: test transcode of '{}'", sample.display());

    if !sample.is_file() {
        return Err(CoreError::Preflight(format!(
            "sample file '{}' not found",
            sample.display()
        )));
    }
    let base = sample.file_name().ok_or_else(|| {
        CoreError::PathError(format!("'{}' has no file name", sample.display()))
    })?;

    std::fs::create_dir_all(&config.scratch_dir)?;
    let output = ScratchFile::new(config.scratch_dir.join(format!(
        "{PREFLIGHT_PREFIX}{}",
        base.to_string_lossy()
    )));

    let request = TranscodeRequest::from_config(config, sample, output.path());
    match run_transcode(spawner, &request, reporter) {
        Ok(()) => {
            log::info!("Preflight passed: ffmpeg is working");
            Ok(())
        }
        Err(e) => {
            log::error!("Preflight failed: {}", e.summary());
            if let CoreError::TranscodeFailed { stderr, .. } = &e {
                log::error!("ffmpeg output:\n{}", stderr.trim_end());
            }
            Err(e)
        }
    }
}
