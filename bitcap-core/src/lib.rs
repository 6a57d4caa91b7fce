//! Core library for normalizing the video bitrate of objects in an S3 bucket.
//!
//! For every configured folder the library lists the objects under
//! `<scan-prefix>/<folder>/`, probes each supported video through its public
//! delivery URL, and re-encodes the ones whose video bitrate exceeds the
//! threshold: download, ffmpeg at the target bitrate with audio copied,
//! upload over the same key. Failures stay with the object or folder they
//! happened in; the batch always runs to the end.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use bitcap_core::{BatchContext, CoreConfig, CrateFfprobeExecutor, S3ObjectStore};
//! use bitcap_core::{SidecarSpawner, TerminalProgress, process_folders};
//!
//! let config = CoreConfig::load(None).unwrap();
//! config.validate().unwrap();
//!
//! let store = S3ObjectStore::from_config(&config).unwrap();
//! let prober = CrateFfprobeExecutor::new(&config.ffprobe_path, config.probe_timeout_secs);
//! let progress = TerminalProgress::new();
//!
//! let ctx = BatchContext {
//!     config: &config,
//!     store: &store,
//!     prober: &prober,
//!     spawner: &SidecarSpawner,
//!     reporter: &progress,
//! };
//! let summary = process_folders(&ctx);
//! println!("{} object(s) re-encoded", summary.transcoded);
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod inventory;
pub mod job;
pub mod preflight;
pub mod probe;
pub mod progress;
pub mod reporting;
pub mod runner;
pub mod storage;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use external::{
    CrateFfprobeExecutor, FfmpegProcess, FfmpegSpawner, FfprobeExecutor, SidecarSpawner,
    StreamInfo, check_dependency,
};
pub use inventory::{folder_prefix, has_supported_extension, process_folder, process_folders};
pub use job::{BatchContext, TranscodeDecision, decide, execute_job, process_object};
pub use preflight::run_preflight;
pub use probe::{BitrateProbe, NoBitrateReason, delivery_url, probe_bitrate};
pub use progress::{ProgressEvent, ProgressReporter, ProgressStream, SilentProgress, TerminalProgress};
pub use reporting::{BatchSummary, FolderReport, JobStage, ObjectOutcome, format_bitrate};
pub use runner::{AudioPolicy, TranscodeRequest, build_transcode_command, run_transcode};
pub use storage::{ObjectListing, ObjectPage, ObjectStore, S3ObjectStore};
pub use temp_files::ScratchPaths;
pub use utils::{format_bytes, format_duration};
