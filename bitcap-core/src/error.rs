// ============================================================================
// bitcap-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Core Error Types
//
// Every fallible operation in bitcap-core returns `CoreResult<T>`. The
// variants line up with the failure stages of a batch run: probing, the
// storage round-trip (download/upload/list), the external transcode, and
// configuration. Errors are caught at object and folder scope by the
// orchestrator and never abort the batch.

use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] std::io::Error),

    #[error("Failed waiting for {0}: {1}")]
    CommandWait(String, #[source] std::io::Error),

    #[error("{0} exited with {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    /// The external transcode exited non-zero. `stderr` is the captured
    /// diagnostic text, verbatim.
    #[error("Transcode failed ({status})")]
    TranscodeFailed { status: ExitStatus, stderr: String },

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Download of '{key}' failed: {message}")]
    Download { key: String, message: String },

    #[error("Upload to '{key}' failed: {message}")]
    Upload { key: String, message: String },

    #[error("Listing '{prefix}' failed: {message}")]
    List { prefix: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Required command not found: {0}")]
    DependencyNotFound(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Preflight failed: {0}")]
    Preflight(String),

    #[error("{0}")]
    OperationFailed(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

pub fn command_start_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub fn command_wait_error(cmd: impl Into<String>, err: std::io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}

impl CoreError {
    /// Short, single-line description for per-object log lines.
    ///
    /// `TranscodeFailed` keeps its diagnostic text out of the summary; callers
    /// surface `stderr` separately.
    pub fn summary(&self) -> String {
        match self {
            CoreError::TranscodeFailed { status, .. } => {
                format!("ffmpeg exited with {status}")
            }
            other => other.to_string(),
        }
    }
}
