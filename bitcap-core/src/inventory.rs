//! Folder enumeration and the batch loop.
//!
//! Folders are processed one after another, and the objects inside a folder
//! one after another. A listing failure ends that folder only; an object
//! failure ends that object only. Scratch paths depend on the base name
//! alone, so jobs must not overlap.

use crate::external::{FfmpegSpawner, FfprobeExecutor};
use crate::job::{BatchContext, process_object};
use crate::reporting::{BatchSummary, FolderReport};
use crate::storage::{ObjectListing, ObjectStore};
use std::path::Path;

/// `<scan-prefix>/<folder>/` with exactly one slash at each join.
pub fn folder_prefix(scan_prefix: &str, folder: &str) -> String {
    let scan = scan_prefix.trim_end_matches('/');
    let folder = folder.trim_matches('/');
    if scan.is_empty() {
        format!("{folder}/")
    } else {
        format!("{scan}/{folder}/")
    }
}

/// True when `key` ends in one of `extensions`, ignoring ASCII case.
///
/// # Examples
///
/// ```rust
/// use bitcap_core::inventory::has_supported_extension;
///
/// let exts = vec!["mov".to_string(), "mp4".to_string()];
/// assert!(has_supported_extension("lectures/A/1.MP4", &exts));
/// assert!(!has_supported_extension("lectures/A/notes.pdf", &exts));
/// ```
pub fn has_supported_extension(key: &str, extensions: &[String]) -> bool {
    Path::new(key)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// Lists one folder and runs every supported object through the pipeline.
pub fn process_folder<St, Pr, Sp>(ctx: &BatchContext<'_, St, Pr, Sp>, folder: &str) -> FolderReport
where
    St: ObjectStore + ?Sized,
    Pr: FfprobeExecutor + ?Sized,
    Sp: FfmpegSpawner,
{
    let prefix = folder_prefix(&ctx.config.scan_prefix, folder);
    log::info!("Processing folder '{}' ({})", folder, prefix);

    let mut report = FolderReport {
        folder: folder.to_string(),
        prefix: prefix.clone(),
        ..Default::default()
    };

    for item in ObjectListing::new(ctx.store, prefix.as_str()) {
        let key = match item {
            Ok(key) => key,
            Err(e) => {
                log::error!("Folder '{}' failed: {}", folder, e);
                report.error = Some(e.to_string());
                break;
            }
        };

        if !has_supported_extension(&key, &ctx.config.extensions) {
            log::debug!("Ignoring {}: unsupported extension", key);
            report.skipped += 1;
            continue;
        }

        let outcome = process_object(ctx, &key);
        report.outcomes.push((key, outcome));
    }

    log::info!(
        "Folder '{}' done: {} object(s), {} ignored",
        folder,
        report.outcomes.len(),
        report.skipped
    );
    report
}

/// Processes every configured folder in order and totals the results.
pub fn process_folders<St, Pr, Sp>(ctx: &BatchContext<'_, St, Pr, Sp>) -> BatchSummary
where
    St: ObjectStore + ?Sized,
    Pr: FfprobeExecutor + ?Sized,
    Sp: FfmpegSpawner,
{
    let mut summary = BatchSummary::default();
    for folder in &ctx.config.folders {
        let report = process_folder(ctx, folder);
        summary.add_folder(&report);
    }
    summary.log_summary();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoreConfig, CoreConfigBuilder};
    use crate::external::mocks::{MockFfmpegSpawner, MockFfprobeExecutor, MockObjectStore};
    use crate::progress::SilentProgress;
    use crate::reporting::ObjectOutcome;

    fn config(scratch: &Path, folders: &[&str]) -> CoreConfig {
        CoreConfigBuilder::new()
            .bucket("bucket")
            .delivery_domain("cdn.example.com")
            .folders(folders.iter().map(|f| f.to_string()).collect())
            .scratch_dir(scratch)
            .build()
    }

    #[test]
    fn prefix_joins_with_single_slashes() {
        assert_eq!(folder_prefix("lectures/", "A"), "lectures/A/");
        assert_eq!(folder_prefix("lectures", "/A/"), "lectures/A/");
        assert_eq!(folder_prefix("", "A"), "A/");
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        let exts = vec!["mov".to_string(), ".mp4".to_string()];
        assert!(has_supported_extension("a/b.MOV", &exts));
        assert!(has_supported_extension("a/b.mp4", &exts));
        assert!(!has_supported_extension("a/b.mkv", &exts));
        assert!(!has_supported_extension("a/mp4", &exts));
        assert!(!has_supported_extension("a/", &exts));
    }

    #[test]
    fn only_the_high_bitrate_object_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &["A"]);
        let store = MockObjectStore::new();
        store.add_page(
            "lectures/A/",
            &["lectures/A/1.mp4", "lectures/A/2.mov", "lectures/A/notes.txt"],
            None,
        );
        let prober = MockFfprobeExecutor::new();
        prober.expect_video_bitrate("https://cdn.example.com/lectures/A/1.mp4", 6_000_000);
        prober.expect_video_bitrate("https://cdn.example.com/lectures/A/2.mov", 3_000_000);
        let spawner = MockFfmpegSpawner::new();
        spawner.add_success_expectation("transcoded_1.mp4", vec![]);
        let ctx = BatchContext {
            config: &config,
            store: &store,
            prober: &prober,
            spawner: &spawner,
            reporter: &SilentProgress,
        };

        let summary = process_folders(&ctx);

        assert_eq!(summary.transcoded, 1);
        assert_eq!(summary.below_threshold, 1);
        assert_eq!(summary.skipped_extension, 1);
        assert_eq!(store.downloaded_keys(), vec!["lectures/A/1.mp4"]);
        assert_eq!(store.uploaded_keys(), vec!["lectures/A/1.mp4"]);
        assert_eq!(spawner.get_received_calls().len(), 1);
        assert!(!dir.path().join("1.mp4").exists());
        assert!(!dir.path().join("transcoded_1.mp4").exists());
    }

    #[test]
    fn failing_folder_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &["A", "B", "C"]);
        let store = MockObjectStore::new();
        store.add_page("lectures/A/", &["lectures/A/1.mp4"], None);
        store.fail_listing("lectures/B/");
        store.add_page("lectures/C/", &["lectures/C/3.mp4"], None);
        let prober = MockFfprobeExecutor::new();
        prober.expect_video_bitrate("https://cdn.example.com/lectures/A/1.mp4", 1_000_000);
        prober.expect_video_bitrate("https://cdn.example.com/lectures/C/3.mp4", 1_000_000);
        let spawner = MockFfmpegSpawner::new();
        let ctx = BatchContext {
            config: &config,
            store: &store,
            prober: &prober,
            spawner: &spawner,
            reporter: &SilentProgress,
        };

        let summary = process_folders(&ctx);

        assert_eq!(summary.folders_visited, 3);
        assert_eq!(summary.folder_failures.len(), 1);
        assert_eq!(summary.folder_failures[0].0, "B");
        assert_eq!(summary.below_threshold, 2);
        let listed: Vec<String> = store.list_calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(listed, vec!["lectures/A/", "lectures/B/", "lectures/C/"]);
    }

    #[test]
    fn failing_object_does_not_stop_the_folder() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), &["A"]);
        let store = MockObjectStore::new();
        store.add_page("lectures/A/", &["lectures/A/bad.mp4"], Some("next"));
        store.add_page("lectures/A/", &["lectures/A/good.mp4"], None);
        let prober = MockFfprobeExecutor::new();
        prober.expect_failure("https://cdn.example.com/lectures/A/bad.mp4", "Invalid data found");
        prober.expect_video_bitrate("https://cdn.example.com/lectures/A/good.mp4", 2_000_000);
        let spawner = MockFfmpegSpawner::new();
        let ctx = BatchContext {
            config: &config,
            store: &store,
            prober: &prober,
            spawner: &spawner,
            reporter: &SilentProgress,
        };

        let report = process_folder(&ctx, "A");

        assert_eq!(report.outcomes.len(), 2);
        assert!(matches!(report.outcomes[0].1, ObjectOutcome::ProbeFailed(_)));
        assert_eq!(
            report.outcomes[1].1,
            ObjectOutcome::BelowThreshold { bitrate: 2_000_000 }
        );
        assert!(report.error.is_none());
    }
}
