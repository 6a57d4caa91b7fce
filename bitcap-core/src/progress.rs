// ============================================================================
// bitcap-core/src/progress.rs
// ============================================================================
//
// PROGRESS: Live Transcode Progress from the ffmpeg Diagnostic Stream
//
// ffmpeg writes its periodic status to stderr as free-form text. Lines that
// carry both a `time=` and a `speed=` token become a `ProgressEvent`; every
// other line is ignored for reporting but kept, so a failed run can return
// its diagnostic text.
//
// KEY COMPONENTS:
// - ProgressEvent: elapsed-time and speed tokens from one line
// - ProgressStream: iterator adapter over the process's event stream
// - ProgressReporter: sink for live events (terminal spinner or silent)
//
// AI-ASSISTANT-INFO: ffmpeg progress parsing and reporting

use ffmpeg_sidecar::event::FfmpegEvent;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// PROGRESS EVENTS
// ============================================================================

/// One progress report from a running transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Elapsed media time, as printed (e.g. `00:01:02.50`)
    pub time: String,
    /// Encoding speed multiplier, as printed (e.g. `1.23x`)
    pub speed: String,
}

impl ProgressEvent {
    /// Extracts a progress event from one diagnostic line.
    ///
    /// Returns `None` unless the line carries both tokens.
    pub fn parse(line: &str) -> Option<Self> {
        let time = find_token(line, "time")?;
        let speed = find_token(line, "speed")?;
        Some(Self {
            time: time.to_string(),
            speed: speed.to_string(),
        })
    }
}

/// Finds `<name>=<token>` as a whole word and returns the token.
///
/// ffmpeg pads some values (`speed=   1x`), so spaces after `=` are skipped.
/// `out_time=` does not match `time`.
fn find_token<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=");
    let mut search_from = 0;
    while let Some(offset) = line[search_from..].find(&needle) {
        let start = search_from + offset;
        let preceded_by_word = line[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        search_from = start + needle.len();
        if preceded_by_word {
            continue;
        }
        let value = line[search_from..].trim_start_matches(' ');
        let token = value
            .split(char::is_whitespace)
            .next()
            .filter(|t| !t.is_empty());
        if token.is_some() {
            return token;
        }
    }
    None
}

/// Is this one of the `key=value` lines written by `-progress`?
///
/// ffmpeg pads some values (`bitrate= 838.9kbits/s`, `speed=   1x`), so
/// leading spaces in the value are allowed.
fn is_progress_block_line(line: &str) -> bool {
    match line.split_once('=') {
        Some((key, value)) => {
            let value = value.trim_start();
            !key.is_empty()
                && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !value.is_empty()
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Returns the text line an event was parsed from, if it has one.
///
/// ffmpeg-sidecar turns banner, input, stream and mapping lines into parsed
/// events; their raw line is recovered so the captured text stays complete.
fn diagnostic_text(event: &FfmpegEvent) -> Option<&str> {
    match event {
        FfmpegEvent::Progress(progress) => Some(&progress.raw_log_message),
        FfmpegEvent::Log(_, line) | FfmpegEvent::Error(line) => Some(line),
        FfmpegEvent::ParsedStreamMapping(line) => Some(line),
        FfmpegEvent::ParsedVersion(version) => Some(&version.raw_log_message),
        FfmpegEvent::ParsedConfiguration(config) => Some(&config.raw_log_message),
        FfmpegEvent::ParsedInput(input) => Some(&input.raw_log_message),
        FfmpegEvent::ParsedOutput(output) => Some(&output.raw_log_message),
        FfmpegEvent::ParsedDuration(duration) => Some(&duration.raw_log_message),
        FfmpegEvent::ParsedInputStream(stream) | FfmpegEvent::ParsedOutputStream(stream) => {
            Some(&stream.raw_log_message)
        }
        _ => None,
    }
}

// ============================================================================
// PROGRESS STREAM
// ============================================================================

/// Iterator adapter yielding `ProgressEvent`s from a process's event stream.
///
/// Each call to `next` blocks until the process emits a line carrying
/// progress or closes its stream. Non-progress lines are captured and can be
/// read back with [`ProgressStream::captured`] once the stream ends. The
/// `-progress` key/value block and the periodic stats lines are not captured.
pub struct ProgressStream<I> {
    events: I,
    captured: String,
}

impl<I> ProgressStream<I>
where
    I: Iterator<Item = FfmpegEvent>,
{
    pub fn new(events: I) -> Self {
        Self {
            events,
            captured: String::new(),
        }
    }

    /// Diagnostic text consumed so far.
    pub fn captured(&self) -> &str {
        &self.captured
    }

    /// Drains whatever is left of the stream and returns the captured text.
    pub fn into_captured(mut self) -> String {
        while self.next().is_some() {}
        self.captured
    }

    fn capture(&mut self, line: &str) {
        if line.trim().is_empty() || is_progress_block_line(line.trim()) {
            return;
        }
        self.captured.push_str(line.trim_end());
        self.captured.push('\n');
    }
}

impl<I> Iterator for ProgressStream<I>
where
    I: Iterator<Item = FfmpegEvent>,
{
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let event = self.events.next()?;
            let Some(line) = diagnostic_text(&event) else {
                continue;
            };
            if let Some(progress) = ProgressEvent::parse(line) {
                return Some(progress);
            }
            self.capture(line);
        }
    }
}

// ============================================================================
// REPORTERS
// ============================================================================

/// Receives live progress for one transcode at a time.
pub trait ProgressReporter {
    /// A transcode for `label` is starting.
    fn start(&self, label: &str);
    fn update(&self, event: &ProgressEvent);
    /// The process has exited, successfully or not.
    fn finish(&self);
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for &T {
    fn start(&self, label: &str) {
        (**self).start(label)
    }

    fn update(&self, event: &ProgressEvent) {
        (**self).update(event)
    }

    fn finish(&self) {
        (**self).finish()
    }
}

/// Discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn start(&self, _label: &str) {}
    fn update(&self, _event: &ProgressEvent) {}
    fn finish(&self) {}
}

/// Draws a single overwritable status line with an indicatif spinner.
#[derive(Default)]
pub struct TerminalProgress {
    progress: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        // A poisoned lock only means an earlier draw panicked; keep drawing.
        let mut guard = match self.progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }
}

impl ProgressReporter for TerminalProgress {
    fn start(&self, label: &str) {
        self.with_bar(|slot| {
            if let Some(previous) = slot.take() {
                previous.finish_and_clear();
            }
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("  {spinner} {prefix} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
            pb.set_style(style);
            pb.set_prefix(label.to_string());
            pb.set_message("starting");
            pb.enable_steady_tick(Duration::from_millis(120));
            *slot = Some(pb);
        });
    }

    fn update(&self, event: &ProgressEvent) {
        self.with_bar(|slot| {
            if let Some(pb) = slot.as_ref() {
                pb.set_message(format!("time={} speed={}", event.time, event.speed));
            }
        });
    }

    fn finish(&self) {
        self.with_bar(|slot| {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_sidecar::event::{FfmpegDuration, FfmpegInput, LogLevel};

    fn log(line: &str) -> FfmpegEvent {
        FfmpegEvent::Log(LogLevel::Info, line.to_string())
    }

    #[test]
    fn parses_stats_line() {
        let line = "frame=  240 fps= 48 q=28.0 size=    1024kB time=00:00:10.00 bitrate= 838.9kbits/s speed=1.98x";
        let event = ProgressEvent::parse(line).unwrap();
        assert_eq!(event.time, "00:00:10.00");
        assert_eq!(event.speed, "1.98x");
    }

    #[test]
    fn padded_speed_is_read() {
        let event = ProgressEvent::parse("time=00:00:01.00 speed=   1x").unwrap();
        assert_eq!(event.speed, "1x");
    }

    #[test]
    fn both_tokens_are_required() {
        assert!(ProgressEvent::parse("time=00:00:01.00 bitrate=N/A").is_none());
        assert!(ProgressEvent::parse("speed=2.0x").is_none());
        assert!(ProgressEvent::parse("Stream mapping:").is_none());
    }

    #[test]
    fn out_time_is_not_time() {
        assert!(ProgressEvent::parse("out_time=00:00:01.000000 speed=1.0x").is_none());
        let event = ProgressEvent::parse("out_time=00:00:01 time=00:00:02.00 speed=1.0x").unwrap();
        assert_eq!(event.time, "00:00:02.00");
    }

    #[test]
    fn stream_yields_progress_and_captures_the_rest() {
        let events = vec![
            log("Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'in.mp4':"),
            log("out_time=00:00:01.000000"),
            log("speed=1.0x"),
            log("frame=1 time=00:00:01.00 speed=1.0x"),
            FfmpegEvent::Error("in.mp4: Invalid data found".to_string()),
            FfmpegEvent::Done,
        ];
        let mut stream = ProgressStream::new(events.into_iter());

        let first = stream.next().unwrap();
        assert_eq!(first.time, "00:00:01.00");
        assert!(stream.next().is_none());

        let captured = stream.into_captured();
        assert!(captured.contains("Input #0"));
        assert!(captured.contains("Invalid data found"));
        assert!(!captured.contains("out_time="));
    }

    #[test]
    fn padded_progress_block_is_not_captured() {
        let events = vec![
            log("frame=  240 fps= 48 q=28.0 size=    1024kB time=00:00:10.00 bitrate= 838.9kbits/s speed=1.98x"),
            log("bitrate= 838.9kbits/s"),
            log("speed=   1x"),
            log("progress=continue"),
            log("[aac @ 0x1] Error while decoding stream #0:1"),
        ];
        let stream = ProgressStream::new(events.into_iter());

        assert_eq!(
            stream.into_captured(),
            "[aac @ 0x1] Error while decoding stream #0:1\n"
        );
    }

    #[test]
    fn padded_block_lines_are_recognised() {
        assert!(is_progress_block_line("bitrate= 838.9kbits/s"));
        assert!(is_progress_block_line("speed=   1x"));
        assert!(is_progress_block_line("out_time=00:00:01.000000"));
        assert!(!is_progress_block_line("bitrate="));
        assert!(!is_progress_block_line("Error while opening encoder for output stream #0:0 - maybe incorrect parameters"));
        assert!(!is_progress_block_line("[h264 @ 0x1] key=value pair here"));
    }

    #[test]
    fn parsed_lines_reach_the_captured_text() {
        let input_line = "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'in.mp4':";
        let duration_line = "  Duration: 00:00:05.00, start: 0.000000, bitrate: 6000 kb/s";
        let events = vec![
            FfmpegEvent::ParsedInput(FfmpegInput {
                index: 0,
                duration: None,
                raw_log_message: input_line.to_string(),
            }),
            FfmpegEvent::ParsedDuration(FfmpegDuration {
                input_index: 0,
                duration: 5.0,
                raw_log_message: duration_line.to_string(),
            }),
            FfmpegEvent::ParsedStreamMapping(
                "  Stream #0:0 -> #0:0 (h264 (native) -> h264 (libx264))".to_string(),
            ),
            FfmpegEvent::LogEOF,
            FfmpegEvent::Done,
        ];
        let captured = ProgressStream::new(events.into_iter()).into_captured();

        let lines: Vec<&str> = captured.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], input_line);
        assert_eq!(lines[1], duration_line);
        assert!(lines[2].contains("Stream #0:0 -> #0:0"));
    }

    #[test]
    fn terminal_progress_updates_only_the_status_line() {
        let progress = TerminalProgress::new();
        progress.update(&ProgressEvent {
            time: "0".into(),
            speed: "1x".into(),
        });
        progress.start("1.mp4");
        progress.update(&ProgressEvent {
            time: "00:00:01.00".into(),
            speed: "2.0x".into(),
        });
        let message = progress
            .progress
            .lock()
            .unwrap()
            .as_ref()
            .map(|pb| pb.message());
        assert_eq!(message.as_deref(), Some("time=00:00:01.00 speed=2.0x"));

        progress.finish();
        assert!(progress.progress.lock().unwrap().is_none());
    }

    #[test]
    fn silent_progress_accepts_everything() {
        let reporter = SilentProgress;
        reporter.start("x");
        reporter.update(&ProgressEvent {
            time: "0".into(),
            speed: "1x".into(),
        });
        reporter.finish();
    }
}
