// ============================================================================
// bitcap-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig, starting from the library defaults.
// Used by the CLI to layer flags over file/env values and by tests to build
// small configurations without spelling out every field.

use std::path::PathBuf;

use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use bitcap_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .bucket("media-bucket")
///     .scan_prefix("lectures/")
///     .delivery_domain("media.example.com")
///     .bitrate_threshold(5_000_000)
///     .target_bitrate(4_000_000)
///     .folders(vec!["intro".to_string()])
///     .build();
///
/// assert_eq!(config.folders.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a builder holding the library defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration (e.g. one loaded from file/env).
    pub fn from_config(config: CoreConfig) -> Self {
        Self { config }
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = Some(region.into());
        self
    }

    pub fn endpoint_url(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint_url = Some(endpoint.into());
        self
    }

    pub fn scan_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.scan_prefix = prefix.into();
        self
    }

    pub fn delivery_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.delivery_domain = domain.into();
        self
    }

    /// Sets the re-encode threshold in bits/second.
    pub fn bitrate_threshold(mut self, bps: u64) -> Self {
        self.config.bitrate_threshold = bps;
        self
    }

    /// Sets the output video bitrate in bits/second.
    pub fn target_bitrate(mut self, bps: u64) -> Self {
        self.config.target_bitrate = bps;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Replaces the ordered folder list.
    pub fn folders(mut self, folders: Vec<String>) -> Self {
        self.config.folders = folders;
        self
    }

    /// Sets the remote probe timeout; 0 disables it.
    pub fn probe_timeout_secs(mut self, secs: u64) -> Self {
        self.config.probe_timeout_secs = secs;
        self
    }

    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffmpeg_path = path.into();
        self
    }

    pub fn ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffprobe_path = path.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = dir.into();
        self
    }

    /// Replaces the supported extensions. A leading dot is stripped.
    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();
        self
    }

    pub fn preflight_sample(mut self, sample: impl Into<PathBuf>) -> Self {
        self.config.preflight_sample = Some(sample.into());
        self
    }

    /// Builds the configuration. Call `CoreConfig::validate` before use.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
