//! FFprobe integration for remote stream inspection
//!
//! Runs the configured ffprobe binary against a local path or a public URL
//! and returns the per-stream metadata the bitrate decision needs. The JSON
//! output is deserialized with the `ffprobe` crate's types.

use crate::error::{CoreError, CoreResult, command_start_error};
use ffprobe::FfProbe;
use std::path::PathBuf;
use std::process::Command;

/// The subset of ffprobe stream metadata bitcap reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    /// "video", "audio", "data", ...
    pub codec_type: Option<String>,
    /// Declared stream bitrate as reported, usually a decimal string
    pub bit_rate: Option<String>,
}

impl StreamInfo {
    pub fn video(bit_rate: Option<&str>) -> Self {
        Self {
            codec_type: Some("video".to_string()),
            bit_rate: bit_rate.map(str::to_string),
        }
    }

    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }
}

/// Trait for querying stream metadata, allowing mocking.
pub trait FfprobeExecutor {
    /// Returns every stream of `target`, in container order.
    fn streams(&self, target: &str) -> CoreResult<Vec<StreamInfo>>;
}

/// Concrete implementation that shells out to the ffprobe binary.
#[derive(Debug, Clone)]
pub struct CrateFfprobeExecutor {
    ffprobe_bin: PathBuf,
    timeout_secs: u64,
}

impl CrateFfprobeExecutor {
    /// `timeout_secs` bounds network reads/writes for URL targets; 0 disables it.
    pub fn new(ffprobe_bin: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
            timeout_secs,
        }
    }

    fn build_args(&self, target: &str) -> Vec<String> {
        let mut args: Vec<String> = ["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if self.timeout_secs > 0 && target.contains("://") {
            // microseconds
            args.push("-rw_timeout".to_string());
            args.push((self.timeout_secs * 1_000_000).to_string());
        }
        args.push(target.to_string());
        args
    }
}

impl Default for CrateFfprobeExecutor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FFPROBE_PATH, crate::config::DEFAULT_PROBE_TIMEOUT_SECS)
    }
}

impl FfprobeExecutor for CrateFfprobeExecutor {
    fn streams(&self, target: &str) -> CoreResult<Vec<StreamInfo>> {
        log::debug!("Running ffprobe for stream info on: {}", target);
        let cmd_name = self.ffprobe_bin.display().to_string();

        let output = Command::new(&self.ffprobe_bin)
            .args(self.build_args(target))
            .output()
            .map_err(|e| command_start_error(cmd_name.clone(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::debug!("ffprobe exited with {} for {}", output.status, target);
            return Err(CoreError::Probe(if stderr.is_empty() {
                format!("{cmd_name} exited with {} for {target}", output.status)
            } else {
                format!("{cmd_name} exited with {} for {target}: {stderr}", output.status)
            }));
        }

        parse_streams(&output.stdout)
    }
}

/// Converts ffprobe's JSON document into `StreamInfo`s.
pub(crate) fn parse_streams(json: &[u8]) -> CoreResult<Vec<StreamInfo>> {
    let metadata: FfProbe = serde_json::from_slice(json)
        .map_err(|e| CoreError::JsonParse(format!("ffprobe output: {e}")))?;
    Ok(metadata
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            codec_type: s.codec_type,
            bit_rate: s.bit_rate,
        })
        .collect())
}
