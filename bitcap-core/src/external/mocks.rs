// bitcap-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for unit tests and, through the "test-mocks" feature, for
// downstream test suites.

use super::{FfmpegEventStream, FfmpegProcess, FfmpegSpawner, FfprobeExecutor, StreamInfo};
use crate::error::{CoreError, CoreResult};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::storage::{ObjectPage, ObjectStore};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::os::unix::process::ExitStatusExt; // For ExitStatus::from_raw
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;

/// Shared, ordered record of calls across several mocks.
pub type MockJournal = Rc<RefCell<Vec<String>>>;

/// Builds an ffmpeg stderr line event.
pub fn log_line(line: &str) -> FfmpegEvent {
    FfmpegEvent::Log(LogLevel::Info, line.to_string())
}

/// Builds a periodic stats line event carrying `time=` and `speed=`.
pub fn stats_line(time: &str, speed: &str) -> FfmpegEvent {
    log_line(&format!(
        "frame=  100 fps= 25 q=28.0 size=     512kB time={time} bitrate=4000.0kbits/s speed={speed}"
    ))
}

// ============================================================================
// FFMPEG
// ============================================================================

/// Mock implementation of FfmpegProcess.
pub struct MockFfmpegProcess {
    /// Events to emit when the stream is taken.
    events_to_emit: Vec<FfmpegEvent>,
    /// Exit status to return when wait is called.
    exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn events(&mut self) -> CoreResult<FfmpegEventStream> {
        Ok(Box::new(std::mem::take(&mut self.events_to_emit).into_iter()))
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// Represents an expected ffmpeg command call and its mock result.
struct MockFfmpegExpectation {
    arg_pattern: String,
    result: CoreResult<(Vec<FfmpegEvent>, ExitStatus)>,
    create_dummy_output: bool,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// Each spawn consumes the first expectation whose pattern is contained in
/// any argument. A spawn with no matching expectation fails to start.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Rc<RefCell<Vec<MockFfmpegExpectation>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
    journal: Option<MockJournal>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records each spawn as `transcode <input>` in `journal`.
    pub fn with_journal(mut self, journal: MockJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Expects a run that emits `events`, writes its output file, and exits 0.
    pub fn add_success_expectation(&self, arg_pattern: &str, events: Vec<FfmpegEvent>) {
        self.push(arg_pattern, Ok((events, ExitStatus::from_raw(0))), true);
    }

    /// Expects a run that emits `events` and exits with `exit_code`.
    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<FfmpegEvent>,
        exit_code: i32,
    ) {
        // wait(2) status layout: exit code in the second byte
        self.push(
            arg_pattern,
            Ok((events, ExitStatus::from_raw(exit_code << 8))),
            false,
        );
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.push(arg_pattern, Err(error), false);
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }

    fn push(
        &self,
        arg_pattern: &str,
        result: CoreResult<(Vec<FfmpegEvent>, ExitStatus)>,
        create_dummy_output: bool,
    ) {
        self.expectations.borrow_mut().push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result,
            create_dummy_output,
        });
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.borrow_mut().push(args.clone());

        if let Some(journal) = &self.journal {
            let input = args
                .iter()
                .position(|a| a == "-i")
                .and_then(|i| args.get(i + 1))
                .cloned()
                .unwrap_or_default();
            journal.borrow_mut().push(format!("transcode {input}"));
        }

        let expectation = {
            let mut expectations = self.expectations.borrow_mut();
            let found = expectations
                .iter()
                .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));
            found.map(|index| expectations.remove(index))
        };

        let Some(expectation) = expectation else {
            log::error!("MockFfmpegSpawner: No expectation found for command args: {:?}", args);
            return Err(CoreError::CommandStart(
                "ffmpeg (mock)".to_string(),
                io::Error::other(format!("no expectation for {args:?}")),
            ));
        };

        let (events, exit_status) = expectation.result?;
        if expectation.create_dummy_output {
            if let Some(output) = args.last() {
                if let Err(e) = std::fs::write(output, b"transcoded") {
                    log::error!("MockFfmpegSpawner failed to create dummy output {}: {}", output, e);
                }
            }
        }
        Ok(MockFfmpegProcess {
            events_to_emit: events,
            exit_status,
        })
    }
}

// ============================================================================
// FFPROBE
// ============================================================================

/// Mock implementation of FfprobeExecutor keyed by probe target.
#[derive(Clone, Default)]
pub struct MockFfprobeExecutor {
    results: Rc<RefCell<HashMap<String, Result<Vec<StreamInfo>, String>>>>,
    received_calls: Rc<RefCell<Vec<String>>>,
}

impl MockFfprobeExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn expect_streams(&self, target: &str, streams: Vec<StreamInfo>) {
        self.results
            .borrow_mut()
            .insert(target.to_string(), Ok(streams));
    }

    /// Shorthand for a single video stream reporting `bps`.
    pub fn expect_video_bitrate(&self, target: &str, bps: u64) {
        self.expect_streams(target, vec![StreamInfo::video(Some(&bps.to_string()))]);
    }

    pub fn expect_failure(&self, target: &str, message: &str) {
        self.results
            .borrow_mut()
            .insert(target.to_string(), Err(message.to_string()));
    }

    pub fn get_received_calls(&self) -> Vec<String> {
        self.received_calls.borrow().clone()
    }
}

impl FfprobeExecutor for MockFfprobeExecutor {
    fn streams(&self, target: &str) -> CoreResult<Vec<StreamInfo>> {
        self.received_calls.borrow_mut().push(target.to_string());
        match self.results.borrow().get(target) {
            Some(Ok(streams)) => Ok(streams.clone()),
            Some(Err(message)) => Err(CoreError::Probe(message.clone())),
            None => Err(CoreError::Probe(format!(
                "MockFfprobeExecutor: No expectation set for {target}"
            ))),
        }
    }
}

// ============================================================================
// OBJECT STORE
// ============================================================================

/// One call received by [`MockObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List { prefix: String, token: Option<String> },
    Download { key: String, path: PathBuf },
    Upload { key: String, path: PathBuf },
}

/// In-memory object store with scripted pages and failure injection.
///
/// Downloads write a small placeholder file; uploads capture the uploaded
/// bytes per key.
#[derive(Clone, Default)]
pub struct MockObjectStore {
    pages: Rc<RefCell<HashMap<String, Vec<ObjectPage>>>>,
    failing_lists: Rc<RefCell<HashSet<String>>>,
    failing_downloads: Rc<RefCell<HashSet<String>>>,
    failing_uploads: Rc<RefCell<HashSet<String>>>,
    uploads: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    calls: Rc<RefCell<Vec<StoreCall>>>,
    journal: Option<MockJournal>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records downloads and uploads as `download <key>` / `upload <key>`.
    pub fn with_journal(mut self, journal: MockJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Appends a page for `prefix`. `next_token` names the following page.
    pub fn add_page(&self, prefix: &str, keys: &[&str], next_token: Option<&str>) {
        self.pages
            .borrow_mut()
            .entry(prefix.to_string())
            .or_default()
            .push(ObjectPage {
                keys: keys.iter().map(|k| k.to_string()).collect(),
                next_token: next_token.map(str::to_string),
            });
    }

    pub fn fail_listing(&self, prefix: &str) {
        self.failing_lists.borrow_mut().insert(prefix.to_string());
    }

    pub fn fail_download(&self, key: &str) {
        self.failing_downloads.borrow_mut().insert(key.to_string());
    }

    pub fn fail_upload(&self, key: &str) {
        self.failing_uploads.borrow_mut().insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    pub fn list_calls(&self) -> Vec<(String, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::List { prefix, token } => Some((prefix, token)),
                _ => None,
            })
            .collect()
    }

    pub fn downloaded_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Download { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Upload { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Bytes of the last successful upload to `key`.
    pub fn uploaded_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.uploads.borrow().get(key).cloned()
    }

    fn note(&self, entry: String) {
        if let Some(journal) = &self.journal {
            journal.borrow_mut().push(entry);
        }
    }
}

impl ObjectStore for MockObjectStore {
    fn list_page(&self, prefix: &str, continuation: Option<&str>) -> CoreResult<ObjectPage> {
        self.calls.borrow_mut().push(StoreCall::List {
            prefix: prefix.to_string(),
            token: continuation.map(str::to_string),
        });

        if self.failing_lists.borrow().contains(prefix) {
            return Err(CoreError::List {
                prefix: prefix.to_string(),
                message: "simulated listing failure".to_string(),
            });
        }

        let pages = self.pages.borrow();
        let Some(pages) = pages.get(prefix) else {
            return Ok(ObjectPage::default());
        };
        let index = match continuation {
            None => Some(0),
            Some(token) => pages
                .iter()
                .position(|p| p.next_token.as_deref() == Some(token))
                .map(|i| i + 1),
        };
        index
            .and_then(|i| pages.get(i))
            .cloned()
            .ok_or_else(|| CoreError::List {
                prefix: prefix.to_string(),
                message: format!("unknown continuation token {continuation:?}"),
            })
    }

    fn download(&self, key: &str, local_path: &Path) -> CoreResult<()> {
        self.calls.borrow_mut().push(StoreCall::Download {
            key: key.to_string(),
            path: local_path.to_path_buf(),
        });
        self.note(format!("download {key}"));

        if self.failing_downloads.borrow().contains(key) {
            return Err(CoreError::Download {
                key: key.to_string(),
                message: "simulated download failure".to_string(),
            });
        }
        std::fs::write(local_path, format!("original:{key}")).map_err(|e| CoreError::Download {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn upload(&self, local_path: &Path, key: &str) -> CoreResult<()> {
        self.calls.borrow_mut().push(StoreCall::Upload {
            key: key.to_string(),
            path: local_path.to_path_buf(),
        });
        self.note(format!("upload {key}"));

        if self.failing_uploads.borrow().contains(key) {
            return Err(CoreError::Upload {
                key: key.to_string(),
                message: "simulated upload failure".to_string(),
            });
        }
        let bytes = std::fs::read(local_path).map_err(|e| CoreError::Upload {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.uploads.borrow_mut().insert(key.to_string(), bytes);
        Ok(())
    }
}

// ============================================================================
// PROGRESS
// ============================================================================

/// Progress reporter that records everything it receives.
#[derive(Default)]
pub struct RecordingProgress {
    pub started: RefCell<Vec<String>>,
    pub events: RefCell<Vec<ProgressEvent>>,
    pub finished: RefCell<usize>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for RecordingProgress {
    fn start(&self, label: &str) {
        self.started.borrow_mut().push(label.to_string());
    }

    fn update(&self, event: &ProgressEvent) {
        self.events.borrow_mut().push(event.clone());
    }

    fn finish(&self) {
        *self.finished.borrow_mut() += 1;
    }
}
