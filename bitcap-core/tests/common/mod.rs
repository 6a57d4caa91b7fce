// bitcap-core/tests/common/mod.rs
//
// Hand-rolled stand-ins for the object store, the prober and ffmpeg, built
// only on the public traits.

#![allow(dead_code)]

use bitcap_core::external::{FfmpegEventStream, FfmpegProcess, FfmpegSpawner};
use bitcap_core::{CoreError, CoreResult, FfprobeExecutor, ObjectPage, ObjectStore, StreamInfo};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;

/// Single-page bucket held in memory.
#[derive(Default)]
pub struct MemoryBucket {
    pub objects: RefCell<BTreeMap<String, Vec<u8>>>,
    pub broken_prefixes: HashSet<String>,
    pub log: RefCell<Vec<String>>,
}

impl MemoryBucket {
    pub fn with_objects(keys: &[&str]) -> Self {
        let bucket = Self::default();
        for key in keys {
            bucket
                .objects
                .borrow_mut()
                .insert(key.to_string(), format!("original {key}").into_bytes());
        }
        bucket
    }

    pub fn entries(&self, verb: &str) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix(&format!("{verb} ")).map(str::to_string))
            .collect()
    }
}

impl ObjectStore for MemoryBucket {
    fn list_page(&self, prefix: &str, _continuation: Option<&str>) -> CoreResult<ObjectPage> {
        self.log.borrow_mut().push(format!("list {prefix}"));
        if self.broken_prefixes.contains(prefix) {
            return Err(CoreError::List {
                prefix: prefix.to_string(),
                message: "AccessDenied".to_string(),
            });
        }
        let keys = self
            .objects
            .borrow()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        Ok(ObjectPage { keys, next_token: None })
    }

    fn download(&self, key: &str, local_path: &Path) -> CoreResult<()> {
        self.log.borrow_mut().push(format!("download {key}"));
        let bytes = self.objects.borrow().get(key).cloned().ok_or_else(|| CoreError::Download {
            key: key.to_string(),
            message: "NoSuchKey".to_string(),
        })?;
        std::fs::write(local_path, bytes)?;
        Ok(())
    }

    fn upload(&self, local_path: &Path, key: &str) -> CoreResult<()> {
        self.log.borrow_mut().push(format!("upload {key}"));
        let bytes = std::fs::read(local_path)?;
        self.objects.borrow_mut().insert(key.to_string(), bytes);
        Ok(())
    }
}

/// Answers probes from a URL -> bitrate table; unknown URLs fail.
#[derive(Default)]
pub struct TableProber {
    pub bitrates: HashMap<String, u64>,
}

impl TableProber {
    pub fn with(entries: &[(&str, u64)]) -> Self {
        Self {
            bitrates: entries.iter().map(|(u, b)| (u.to_string(), *b)).collect(),
        }
    }
}

impl FfprobeExecutor for TableProber {
    fn streams(&self, target: &str) -> CoreResult<Vec<StreamInfo>> {
        match self.bitrates.get(target) {
            Some(bps) => Ok(vec![
                StreamInfo {
                    codec_type: Some("audio".to_string()),
                    bit_rate: Some("128000".to_string()),
                },
                StreamInfo::video(Some(&bps.to_string())),
            ]),
            None => Err(CoreError::Probe(format!("HTTP error 404 Not Found: {target}"))),
        }
    }
}

/// Stand-in ffmpeg: writes `<input bytes> re-encoded` to the output path and
/// exits with `exit_code`.
pub struct FakeFfmpeg {
    pub exit_code: i32,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl FakeFfmpeg {
    pub fn succeeding() -> Self {
        Self {
            exit_code: 0,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(exit_code: i32) -> Self {
        Self {
            exit_code,
            calls: RefCell::new(Vec::new()),
        }
    }
}

pub struct FakeProcess {
    events: Vec<FfmpegEvent>,
    status: ExitStatus,
}

impl FfmpegProcess for FakeProcess {
    fn events(&mut self) -> CoreResult<FfmpegEventStream> {
        Ok(Box::new(std::mem::take(&mut self.events).into_iter()))
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.status)
    }
}

impl FfmpegSpawner for FakeFfmpeg {
    type Process = FakeProcess;

    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<FakeProcess> {
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.borrow_mut().push(args.clone());

        let input = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_default();
        let output = args.last().cloned().unwrap_or_default();

        let events = if self.exit_code == 0 {
            let mut bytes = std::fs::read(&input)?;
            bytes.extend_from_slice(b" re-encoded");
            std::fs::write(&output, bytes)?;
            vec![
                FfmpegEvent::Log(LogLevel::Info, format!("Input #0, mov,mp4,m4a,3gp,3g2,mj2, from '{input}':")),
                FfmpegEvent::Log(
                    LogLevel::Info,
                    "frame=   50 fps=0.0 q=29.0 size=     256kB time=00:00:02.00 bitrate=1048.6kbits/s speed=3.9x".to_string(),
                ),
            ]
        } else {
            vec![FfmpegEvent::Log(
                LogLevel::Error,
                format!("{input}: Invalid data found when processing input"),
            )]
        };

        Ok(FakeProcess {
            events,
            status: ExitStatus::from_raw(self.exit_code << 8),
        })
    }
}
