//! Configuration structures and constants for the bitcap-core library.
//!
//! A `CoreConfig` is built once at startup (defaults, then an optional JSON
//! file, then `BITCAP_*` environment variables, then CLI flags) and passed by
//! reference into every operation. Nothing in the library reads process-wide
//! configuration state.

mod builder;
pub mod utils;

use crate::error::{CoreError, CoreResult};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use builder::CoreConfigBuilder;
use utils::*;

// Default constants

/// Key prefix under which the per-folder prefixes live.
pub const DEFAULT_SCAN_PREFIX: &str = "lectures/";

/// Objects whose video stream exceeds this rate (bits/second) are re-encoded.
pub const DEFAULT_BITRATE_THRESHOLD: u64 = 5_000_000;

/// Video bitrate (bits/second) requested from ffmpeg for re-encoded objects.
pub const DEFAULT_TARGET_BITRATE: u64 = 4_000_000;

/// Container extensions considered for probing (compared case-insensitively).
pub const DEFAULT_EXTENSIONS: &[&str] = &["mov", "mp4"];

/// Network read/write timeout handed to ffprobe for remote probes.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
pub const DEFAULT_FFPROBE_PATH: &str = "ffprobe";

/// Main configuration structure for the bitcap-core library.
///
/// # Examples
///
/// ```rust
/// use bitcap_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .bucket("media-bucket")
///     .delivery_domain("media.example.com")
///     .folders(vec!["course 1".to_string(), "course 2".to_string()])
///     .dry_run(true)
///     .build();
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Bucket holding the video objects
    pub bucket: String,

    /// Optional region override; otherwise resolved by the AWS default chain
    pub region: Option<String>,

    /// Optional endpoint for S3-compatible stores
    pub endpoint_url: Option<String>,

    /// Key prefix that the folder names are appended to
    pub scan_prefix: String,

    /// Public delivery domain used to build probe URLs
    pub delivery_domain: String,

    /// Bitrate (bits/second) above which an object is re-encoded
    pub bitrate_threshold: u64,

    /// Video bitrate (bits/second) for re-encoded output
    pub target_bitrate: u64,

    /// Log the intended work without downloading, transcoding, or uploading
    pub dry_run: bool,

    /// Folder names processed in order
    pub folders: Vec<String>,

    /// Network timeout for remote probes in seconds (0 disables it)
    pub probe_timeout_secs: u64,

    /// ffmpeg binary used for transcoding
    pub ffmpeg_path: PathBuf,

    /// ffprobe binary used for remote probing
    pub ffprobe_path: PathBuf,

    /// Directory receiving the per-job scratch files
    pub scratch_dir: PathBuf,

    /// Supported container extensions, without the leading dot
    pub extensions: Vec<String>,

    /// Local file transcoded before the batch as a smoke test
    pub preflight_sample: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: None,
            endpoint_url: None,
            scan_prefix: DEFAULT_SCAN_PREFIX.to_string(),
            delivery_domain: String::new(),
            bitrate_threshold: DEFAULT_BITRATE_THRESHOLD,
            target_bitrate: DEFAULT_TARGET_BITRATE,
            dry_run: false,
            folders: Vec::new(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            ffprobe_path: PathBuf::from(DEFAULT_FFPROBE_PATH),
            scratch_dir: std::env::temp_dir(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            preflight_sample: None,
        }
    }
}

impl CoreConfig {
    /// Reads a JSON config file. Missing fields fall back to their defaults.
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Cannot read config file '{}': {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            CoreError::JsonParse(format!("Config file '{}': {e}", path.display()))
        })
    }

    /// Loads defaults (or `config_file` when given) and applies `BITCAP_*`
    /// environment overrides on top.
    pub fn load(config_file: Option<&Path>) -> CoreResult<Self> {
        let base = match config_file {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// Applies `BITCAP_*` environment variables over the current values.
    pub fn with_env_overrides(self) -> Self {
        Self {
            bucket: get_env_string("BITCAP_BUCKET", self.bucket),
            region: get_env_opt_string("BITCAP_REGION").or(self.region),
            endpoint_url: get_env_opt_string("BITCAP_ENDPOINT_URL").or(self.endpoint_url),
            scan_prefix: get_env_string("BITCAP_SCAN_PREFIX", self.scan_prefix),
            delivery_domain: get_env_string("BITCAP_DELIVERY_DOMAIN", self.delivery_domain),
            bitrate_threshold: get_env_u64("BITCAP_BITRATE_THRESHOLD", self.bitrate_threshold),
            target_bitrate: get_env_u64("BITCAP_TARGET_BITRATE", self.target_bitrate),
            dry_run: get_env_bool("BITCAP_DRY_RUN", self.dry_run),
            folders: get_env_list("BITCAP_FOLDERS", self.folders),
            probe_timeout_secs: get_env_u64("BITCAP_PROBE_TIMEOUT_SECS", self.probe_timeout_secs),
            ffmpeg_path: get_env_path("BITCAP_FFMPEG_PATH", self.ffmpeg_path),
            ffprobe_path: get_env_path("BITCAP_FFPROBE_PATH", self.ffprobe_path),
            scratch_dir: get_env_path("BITCAP_SCRATCH_DIR", self.scratch_dir),
            extensions: get_env_list("BITCAP_EXTENSIONS", self.extensions),
            preflight_sample: get_env_opt_string("BITCAP_PREFLIGHT_SAMPLE")
                .map(PathBuf::from)
                .or(self.preflight_sample),
        }
    }

    /// Checks the values a batch run depends on.
    pub fn validate(&self) -> CoreResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(CoreError::Config("bucket must be set".to_string()));
        }
        if self.delivery_domain.trim().is_empty() {
            return Err(CoreError::Config("delivery domain must be set".to_string()));
        }
        self.validate_transcode()?;
        if self.folders.is_empty() {
            return Err(CoreError::Config(
                "at least one folder must be listed".to_string(),
            ));
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(CoreError::Config(
                "at least one media extension must be listed".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks only the transcode parameters; enough for a local preflight.
    pub fn validate_transcode(&self) -> CoreResult<()> {
        if self.bitrate_threshold == 0 || self.target_bitrate == 0 {
            return Err(CoreError::Config(
                "bitrate threshold and target bitrate must be non-zero".to_string(),
            ));
        }
        if self.target_bitrate >= self.bitrate_threshold {
            return Err(CoreError::Config(format!(
                "target bitrate ({}) must be below the threshold ({})",
                self.target_bitrate, self.bitrate_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid() -> CoreConfig {
        CoreConfigBuilder::new()
            .bucket("bucket")
            .delivery_domain("cdn.example.com")
            .folders(vec!["A".to_string()])
            .build()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = CoreConfig::default();
        assert_eq!(config.scan_prefix, "lectures/");
        assert_eq!(config.bitrate_threshold, 5_000_000);
        assert_eq!(config.target_bitrate, 4_000_000);
        assert_eq!(config.extensions, vec!["mov", "mp4"]);
        assert!(!config.dry_run);
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_bucket_and_folders() {
        let mut config = valid();
        config.bucket.clear();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let mut config = valid();
        config.folders.clear();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn validate_rejects_target_at_or_above_threshold() {
        let mut config = valid();
        config.target_bitrate = config.bitrate_threshold;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn json_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bucket": "b", "delivery_domain": "d", "folders": ["x", "y"], "dry_run": true}}"#
        )
        .unwrap();

        let config = CoreConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.bucket, "b");
        assert_eq!(config.folders, vec!["x", "y"]);
        assert!(config.dry_run);
        assert_eq!(config.target_bitrate, DEFAULT_TARGET_BITRATE);
    }

    #[test]
    fn malformed_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            CoreConfig::from_json_file(file.path()),
            Err(CoreError::JsonParse(_))
        ));
    }
}
