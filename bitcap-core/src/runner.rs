// ============================================================================
// bitcap-core/src/runner.rs
// ============================================================================
//
// TRANSCODE RUNNER: Progress-Monitored ffmpeg Invocation
//
// Builds the re-encode command, spawns it, forwards progress from the
// diagnostic stream to a reporter, and turns a non-zero exit into
// `CoreError::TranscodeFailed` carrying the captured diagnostic text.
// The call blocks until the process exits. No retries happen here.
//
// AI-ASSISTANT-INFO: ffmpeg transcode execution with live progress

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegProcess, FfmpegSpawner};
use crate::progress::{ProgressReporter, ProgressStream};

use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::{Path, PathBuf};

/// How the audio stream is carried into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioPolicy {
    /// Stream copy, no re-encode
    #[default]
    Copy,
}

impl AudioPolicy {
    fn codec_arg(self) -> &'static str {
        match self {
            AudioPolicy::Copy => "copy",
        }
    }
}

/// A fully specified re-encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    /// ffmpeg binary
    pub ffmpeg: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Target video bitrate in bits/second
    pub video_bitrate: u64,
    pub audio: AudioPolicy,
    /// Replace an existing output file
    pub overwrite: bool,
}

impl TranscodeRequest {
    /// Request using the configured binary and target bitrate, audio copied
    /// and overwrite enabled.
    pub fn from_config(config: &CoreConfig, input: &Path, output: &Path) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            video_bitrate: config.target_bitrate,
            audio: AudioPolicy::Copy,
            overwrite: true,
        }
    }
}

/// Builds `ffmpeg -progress pipe:2 [-y] -i <in> -b:v <bps> -c:a copy <out>`.
pub fn build_transcode_command(request: &TranscodeRequest) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new_with_path(&request.ffmpeg);
    cmd.args(["-progress", "pipe:2"]);
    if request.overwrite {
        cmd.overwrite();
    }
    cmd.input(&*request.input.to_string_lossy());
    cmd.args(["-b:v", &request.video_bitrate.to_string()]);
    cmd.args(["-c:a", request.audio.codec_arg()]);
    cmd.output(&*request.output.to_string_lossy());
    cmd
}

/// Runs `request` to completion, reporting progress as it goes.
///
/// Returns `Ok(())` on exit status zero. Any other exit status yields
/// `CoreError::TranscodeFailed` with the diagnostic text the process wrote.
pub fn run_transcode<S, R>(spawner: &S, request: &TranscodeRequest, reporter: &R) -> CoreResult<()>
where
    S: FfmpegSpawner,
    R: ProgressReporter + ?Sized,
{
    let cmd = build_transcode_command(request);
    let args: Vec<_> = cmd
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    log::debug!(
        "Executing command: {} {}",
        request.ffmpeg.display(),
        args.join(" ")
    );

    let mut process = spawner.spawn(cmd)?;
    let events = process.events()?;

    let label = request
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| request.input.display().to_string());
    reporter.start(&label);

    let mut stream = ProgressStream::new(events);
    for event in stream.by_ref() {
        reporter.update(&event);
    }
    reporter.finish();

    let status = process.wait()?;
    if status.success() {
        log::debug!("ffmpeg finished for {}", request.input.display());
        return Ok(());
    }

    let stderr = stream.into_captured();
    log::debug!(
        "ffmpeg exited with {} for {} ({} bytes of diagnostics)",
        status,
        request.input.display(),
        stderr.len()
    );
    Err(CoreError::TranscodeFailed { status, stderr })
}
