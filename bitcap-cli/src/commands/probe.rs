// bitcap-cli/src/commands/probe.rs
//
// Read-only probe of individual keys. Prints what a batch run would decide
// for each one without touching the bucket.

use crate::cli::ProbeArgs;
use crate::error::CliResult;
use bitcap_core::{
    BitrateProbe, CoreConfig, CoreError, CoreResult, CrateFfprobeExecutor, TranscodeDecision,
    check_dependency, decide, format_bitrate, probe_bitrate,
};

/// Probes every key; returns the number of keys whose probe failed.
pub fn run_probe(args: &ProbeArgs, config: &CoreConfig) -> CliResult<usize> {
    if config.delivery_domain.trim().is_empty() {
        return Err(CoreError::Config("delivery domain must be set".to_string()));
    }
    check_dependency(&config.ffprobe_path)?;

    let prober = CrateFfprobeExecutor::new(&config.ffprobe_path, config.probe_timeout_secs);
    let mut failures = 0;
    for key in &args.keys {
        let result = probe_bitrate(&prober, config, key);
        if result.is_err() {
            failures += 1;
        }
        println!("{}", describe(key, &result, config));
    }
    Ok(failures)
}

/// One report line per key.
fn describe(key: &str, result: &CoreResult<BitrateProbe>, config: &CoreConfig) -> String {
    match result {
        Ok(BitrateProbe::Available(bps)) => {
            let verdict = match decide(*bps, config) {
                TranscodeDecision::BelowThreshold => "ok",
                TranscodeDecision::DryRun | TranscodeDecision::Transcode => "would re-encode",
            };
            format!("{key}: {} ({verdict})", format_bitrate(*bps))
        }
        Ok(BitrateProbe::NoBitrateAvailable(reason)) => format!("{key}: no bitrate ({reason})"),
        Err(e) => format!("{key}: probe failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcap_core::{CoreConfigBuilder, NoBitrateReason};

    fn config() -> CoreConfig {
        CoreConfigBuilder::new()
            .delivery_domain("cdn.example.com")
            .bitrate_threshold(5_000_000)
            .build()
    }

    #[test]
    fn above_threshold_would_re_encode() {
        let line = describe("lectures/A/1.mp4", &Ok(BitrateProbe::Available(6_000_000)), &config());
        assert_eq!(line, "lectures/A/1.mp4: 6.00 Mbps (would re-encode)");
    }

    #[test]
    fn at_threshold_is_ok() {
        let line = describe("a.mov", &Ok(BitrateProbe::Available(5_000_000)), &config());
        assert_eq!(line, "a.mov: 5.00 Mbps (ok)");
    }

    #[test]
    fn missing_bitrate_names_the_reason() {
        let result = Ok(BitrateProbe::NoBitrateAvailable(NoBitrateReason::NoVideoStream));
        let line = describe("a.mov", &result, &config());
        assert!(line.starts_with("a.mov: no bitrate ("));
    }

    #[test]
    fn probe_error_is_reported() {
        let result = Err(CoreError::Probe("timed out".to_string()));
        let line = describe("a.mov", &result, &config());
        assert_eq!(line, "a.mov: probe failed: Probe failed: timed out");
    }
}
