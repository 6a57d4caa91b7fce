//! Scratch file management.
//!
//! Every job works on files named after the object's base name inside the
//! configured scratch directory. The guards here own those paths and remove
//! them when dropped, so cleanup happens on every exit path of a job,
//! including early returns through `?`.

use crate::error::{CoreError, CoreResult};
use std::io;
use std::path::{Path, PathBuf};

/// Prefix of the re-encoded output next to the download.
pub const TRANSCODED_PREFIX: &str = "transcoded_";

/// Prefix of the preflight output.
pub const PREFLIGHT_PREFIX: &str = "test_output_";

/// Final path segment of an object key.
pub fn key_base_name(key: &str) -> CoreResult<&str> {
    match key.rsplit('/').next() {
        Some(base) if !base.is_empty() && base != "." && base != ".." => Ok(base),
        _ => Err(CoreError::PathError(format!(
            "Object key '{key}' has no usable file name"
        ))),
    }
}

/// A path removed (if present) when the guard is dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove scratch file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// The two scratch paths of one transcode job.
///
/// `<scratch>/<base>` receives the download, `<scratch>/transcoded_<base>`
/// the re-encoded output. Both are removed when this value is dropped.
#[derive(Debug)]
pub struct ScratchPaths {
    download: ScratchFile,
    output: ScratchFile,
}

impl ScratchPaths {
    /// Derives both paths from `key` and makes sure `scratch_dir` exists.
    pub fn for_key(scratch_dir: &Path, key: &str) -> CoreResult<Self> {
        let base = key_base_name(key)?;
        std::fs::create_dir_all(scratch_dir)?;
        Ok(Self {
            download: ScratchFile::new(scratch_dir.join(base)),
            output: ScratchFile::new(scratch_dir.join(format!("{TRANSCODED_PREFIX}{base}"))),
        })
    }

    pub fn download(&self) -> &Path {
        self.download.path()
    }

    pub fn output(&self) -> &Path {
        self.output.path()
    }
}
