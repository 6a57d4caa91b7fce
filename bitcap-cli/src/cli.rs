// bitcap-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use bitcap_core::CoreConfigBuilder;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Bitcap: caps the video bitrate of objects in an S3 bucket",
    long_about = "Probes every video under the configured folders through its delivery URL \
                  and re-encodes the ones above the bitrate threshold in place."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file; BITCAP_* variables and flags override it
    #[arg(short, long, global = true, value_name = "FILE", env = "BITCAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Also write the log to a timestamped file in this directory
    #[arg(long, global = true, value_name = "DIR", env = "BITCAP_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probes and re-encodes every configured folder
    Run(RunArgs),
    /// Transcodes a local sample file to check the ffmpeg setup
    Preflight(PreflightArgs),
    /// Prints the probed video bitrate of the given keys
    Probe(ProbeArgs),
}

// --- Shared Option Groups ---

/// Where the objects live.
#[derive(Args, Debug, Default, Clone)]
pub struct StoreOpts {
    /// Bucket holding the videos
    #[arg(long, value_name = "NAME")]
    pub bucket: Option<String>,

    /// AWS region (defaults to the SDK's resolution chain)
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible stores
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Key prefix the folder names are appended to
    #[arg(long, value_name = "PREFIX")]
    pub scan_prefix: Option<String>,

    /// Folder to process; repeat or separate with commas
    #[arg(long = "folder", value_delimiter = ',', value_name = "NAME")]
    pub folders: Vec<String>,

    /// Extensions considered for probing (e.g. mov,mp4)
    #[arg(long, value_delimiter = ',', value_name = "EXTS")]
    pub extensions: Vec<String>,
}

impl StoreOpts {
    pub fn apply(&self, mut builder: CoreConfigBuilder) -> CoreConfigBuilder {
        if let Some(bucket) = &self.bucket {
            builder = builder.bucket(bucket);
        }
        if let Some(region) = &self.region {
            builder = builder.region(region);
        }
        if let Some(endpoint) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(prefix) = &self.scan_prefix {
            builder = builder.scan_prefix(prefix);
        }
        if !self.folders.is_empty() {
            builder = builder.folders(self.folders.clone());
        }
        if !self.extensions.is_empty() {
            builder = builder.extensions(self.extensions.clone());
        }
        builder
    }
}

/// How remote objects are probed.
#[derive(Args, Debug, Default, Clone)]
pub struct ProbeOpts {
    /// Public domain serving the bucket's objects
    #[arg(long, value_name = "DOMAIN")]
    pub delivery_domain: Option<String>,

    /// ffprobe binary
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<PathBuf>,

    /// Network timeout for each probe in seconds (0 disables it)
    #[arg(long, value_name = "SECONDS")]
    pub probe_timeout: Option<u64>,

    /// Re-encode objects whose video bitrate is above this (bits/second)
    #[arg(long, value_name = "BPS")]
    pub threshold: Option<u64>,
}

impl ProbeOpts {
    pub fn apply(&self, mut builder: CoreConfigBuilder) -> CoreConfigBuilder {
        if let Some(domain) = &self.delivery_domain {
            builder = builder.delivery_domain(domain);
        }
        if let Some(ffprobe) = &self.ffprobe {
            builder = builder.ffprobe_path(ffprobe);
        }
        if let Some(secs) = self.probe_timeout {
            builder = builder.probe_timeout_secs(secs);
        }
        if let Some(bps) = self.threshold {
            builder = builder.bitrate_threshold(bps);
        }
        builder
    }
}

/// How objects are re-encoded.
#[derive(Args, Debug, Default, Clone)]
pub struct TranscodeOpts {
    /// Video bitrate for re-encoded output (bits/second)
    #[arg(long, value_name = "BPS")]
    pub target_bitrate: Option<u64>,

    /// ffmpeg binary
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Directory for downloaded and transcoded scratch files
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,
}

impl TranscodeOpts {
    pub fn apply(&self, mut builder: CoreConfigBuilder) -> CoreConfigBuilder {
        if let Some(bps) = self.target_bitrate {
            builder = builder.target_bitrate(bps);
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            builder = builder.ffmpeg_path(ffmpeg);
        }
        if let Some(dir) = &self.scratch_dir {
            builder = builder.scratch_dir(dir);
        }
        builder
    }
}

// --- Subcommand Arguments ---

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub store: StoreOpts,

    #[command(flatten)]
    pub probe: ProbeOpts,

    #[command(flatten)]
    pub transcode: TranscodeOpts,

    /// Probe and report only; nothing is downloaded or replaced
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Local file transcoded before the batch starts
    #[arg(long, value_name = "FILE")]
    pub preflight_sample: Option<PathBuf>,

    /// Skip the preflight transcode even when a sample is configured
    #[arg(long, default_value_t = false)]
    pub skip_preflight: bool,

    /// Exit with status 1 when any object or folder failed
    #[arg(long, default_value_t = false)]
    pub fail_on_error: bool,
}

impl RunArgs {
    pub fn apply(&self, builder: CoreConfigBuilder) -> CoreConfigBuilder {
        let mut builder = self.transcode.apply(self.probe.apply(self.store.apply(builder)));
        if self.dry_run {
            builder = builder.dry_run(true);
        }
        if let Some(sample) = &self.preflight_sample {
            builder = builder.preflight_sample(sample);
        }
        builder
    }
}

#[derive(Args, Debug)]
pub struct PreflightArgs {
    /// Local video file to transcode
    #[arg(required = true, value_name = "FILE")]
    pub sample: PathBuf,

    #[command(flatten)]
    pub transcode: TranscodeOpts,

    /// Bitrate the target must stay below (bits/second)
    #[arg(long, value_name = "BPS")]
    pub threshold: Option<u64>,
}

impl PreflightArgs {
    pub fn apply(&self, builder: CoreConfigBuilder) -> CoreConfigBuilder {
        let builder = self.transcode.apply(builder);
        match self.threshold {
            Some(bps) => builder.bitrate_threshold(bps),
            None => builder,
        }
    }
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Object keys to probe
    #[arg(required = true, value_name = "KEY")]
    pub keys: Vec<String>,

    #[command(flatten)]
    pub probe: ProbeOpts,
}

impl ProbeArgs {
    pub fn apply(&self, builder: CoreConfigBuilder) -> CoreConfigBuilder {
        self.probe.apply(builder)
    }
}
