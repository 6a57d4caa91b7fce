//! Per-object outcomes and the end-of-run summary.

use crate::probe::NoBitrateReason;
use std::fmt;

/// Step of a transcode job that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Download,
    Transcode,
    Upload,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStage::Download => "download",
            JobStage::Transcode => "transcode",
            JobStage::Upload => "upload",
        })
    }
}

/// Terminal state of one object in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectOutcome {
    /// Re-encoded and replaced in place
    Transcoded { bitrate: u64 },
    /// At or under the threshold; untouched
    BelowThreshold { bitrate: u64 },
    /// Over the threshold but dry-run is on
    DryRun { bitrate: u64 },
    /// Probe succeeded but gave nothing to compare
    NoBitrate(NoBitrateReason),
    /// Probe itself failed
    ProbeFailed(String),
    Failed { stage: JobStage, message: String },
}

impl ObjectOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ObjectOutcome::ProbeFailed(_) | ObjectOutcome::Failed { .. })
    }
}

/// Objects seen in one folder and how each ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderReport {
    pub folder: String,
    pub prefix: String,
    /// `(key, outcome)` in listing order
    pub outcomes: Vec<(String, ObjectOutcome)>,
    /// Keys skipped for their extension
    pub skipped: usize,
    /// Set when listing the folder failed; objects before the failure are kept
    pub error: Option<String>,
}

/// Totals over a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub folders_visited: usize,
    pub folder_failures: Vec<(String, String)>,
    pub objects_seen: usize,
    pub skipped_extension: usize,
    pub transcoded: usize,
    pub below_threshold: usize,
    pub dry_run: usize,
    pub no_bitrate: usize,
    pub probe_failed: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &ObjectOutcome) {
        self.objects_seen += 1;
        match outcome {
            ObjectOutcome::Transcoded { .. } => self.transcoded += 1,
            ObjectOutcome::BelowThreshold { .. } => self.below_threshold += 1,
            ObjectOutcome::DryRun { .. } => self.dry_run += 1,
            ObjectOutcome::NoBitrate(_) => self.no_bitrate += 1,
            ObjectOutcome::ProbeFailed(_) => self.probe_failed += 1,
            ObjectOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Folds one folder's report into the totals.
    pub fn add_folder(&mut self, report: &FolderReport) {
        self.folders_visited += 1;
        self.skipped_extension += report.skipped;
        for (_, outcome) in &report.outcomes {
            self.record(outcome);
        }
        if let Some(error) = &report.error {
            self.folder_failures
                .push((report.folder.clone(), error.clone()));
        }
    }

    /// Any object or folder failure.
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.probe_failed > 0 || !self.folder_failures.is_empty()
    }

    pub fn log_summary(&self) {
        log::info!(
            "Batch complete: {} folder(s), {} object(s) considered, {} skipped by extension",
            self.folders_visited,
            self.objects_seen,
            self.skipped_extension
        );
        log::info!(
            "  transcoded: {}, under threshold: {}, dry-run: {}, no bitrate: {}",
            self.transcoded,
            self.below_threshold,
            self.dry_run,
            self.no_bitrate
        );
        if self.has_failures() {
            log::warn!(
                "  probe failures: {}, job failures: {}, folder failures: {}",
                self.probe_failed,
                self.failed,
                self.folder_failures.len()
            );
            for (folder, error) in &self.folder_failures {
                log::warn!("  folder '{}': {}", folder, error);
            }
        }
    }
}

/// Formats bits/second as megabits with two decimals, e.g. `6.00 Mbps`.
pub fn format_bitrate(bps: u64) -> String {
    format!("{:.2} Mbps", bps as f64 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitrate_formatting() {
        assert_eq!(format_bitrate(6_000_000), "6.00 Mbps");
        assert_eq!(format_bitrate(4_123_456), "4.12 Mbps");
        assert_eq!(format_bitrate(0), "0.00 Mbps");
    }

    #[test]
    fn summary_counts_and_failure_flag() {
        let mut summary = BatchSummary::default();
        let report = FolderReport {
            folder: "A".into(),
            prefix: "lectures/A/".into(),
            outcomes: vec![
                ("a".into(), ObjectOutcome::Transcoded { bitrate: 6_000_000 }),
                ("b".into(), ObjectOutcome::BelowThreshold { bitrate: 3_000_000 }),
            ],
            skipped: 2,
            error: None,
        };
        summary.add_folder(&report);
        assert_eq!(summary.folders_visited, 1);
        assert_eq!(summary.objects_seen, 2);
        assert_eq!(summary.skipped_extension, 2);
        assert!(!summary.has_failures());

        summary.add_folder(&FolderReport {
            folder: "B".into(),
            error: Some("listing failed".into()),
            ..Default::default()
        });
        assert!(summary.has_failures());
        assert_eq!(summary.folder_failures, vec![("B".to_string(), "listing failed".to_string())]);
    }

    #[test]
    fn no_bitrate_is_not_a_failure() {
        assert!(!ObjectOutcome::NoBitrate(NoBitrateReason::NoVideoStream).is_failure());
        assert!(ObjectOutcome::ProbeFailed("x".into()).is_failure());
    }
}
