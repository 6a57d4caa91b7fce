//! Remote bitrate probing.
//!
//! The probe reads stream metadata through the public delivery URL of an
//! object, never through the storage API, and never downloads the media.
//! "This object has no usable bitrate" is an ordinary answer
//! ([`BitrateProbe::NoBitrateAvailable`]); only a failure of the probe itself
//! is an error.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::{FfprobeExecutor, StreamInfo};
use std::fmt;

/// Why a probed object has no bitrate to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoBitrateReason {
    /// No stream of type "video"
    NoVideoStream,
    /// The first video stream has no `bit_rate`
    MissingBitRate,
    /// `bit_rate` is present but not an integer
    UnparseableBitRate,
}

impl fmt::Display for NoBitrateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoBitrateReason::NoVideoStream => "no video stream",
            NoBitrateReason::MissingBitRate => "video stream reports no bitrate",
            NoBitrateReason::UnparseableBitRate => "video stream bitrate is not a number",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitrateProbe {
    /// Video bitrate in bits/second
    Available(u64),
    NoBitrateAvailable(NoBitrateReason),
}

/// Public URL for `key` on `domain`.
///
/// Each path segment is percent-encoded; the separating slashes are kept.
/// `domain` may carry its own scheme, otherwise https is used.
pub fn delivery_url(domain: &str, key: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    let base = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    };
    let path = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{base}/{path}")
}

/// Picks the bitrate out of a stream list: first video stream only.
pub fn select_video_bitrate(streams: &[StreamInfo]) -> BitrateProbe {
    let Some(video) = streams.iter().find(|s| s.is_video()) else {
        return BitrateProbe::NoBitrateAvailable(NoBitrateReason::NoVideoStream);
    };
    match video.bit_rate.as_deref().map(str::trim) {
        None | Some("") | Some("N/A") => {
            BitrateProbe::NoBitrateAvailable(NoBitrateReason::MissingBitRate)
        }
        Some(raw) => match raw.parse::<u64>() {
            Ok(bps) => BitrateProbe::Available(bps),
            Err(_) => BitrateProbe::NoBitrateAvailable(NoBitrateReason::UnparseableBitRate),
        },
    }
}

/// Probes the video bitrate of `key` through its delivery URL.
///
/// Errors from the probe tool (start failure, non-zero exit, timeout,
/// malformed output) come back as `CoreError::Probe`.
pub fn probe_bitrate<P>(executor: &P, config: &CoreConfig, key: &str) -> CoreResult<BitrateProbe>
where
    P: FfprobeExecutor + ?Sized,
{
    let url = delivery_url(&config.delivery_domain, key);
    log::debug!("Probing {} via {}", key, url);

    let streams = executor.streams(&url).map_err(|e| match e {
        CoreError::Probe(_) => e,
        other => CoreError::Probe(other.to_string()),
    })?;

    Ok(select_video_bitrate(&streams))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfigBuilder;
    use crate::external::mocks::MockFfprobeExecutor;

    fn audio() -> StreamInfo {
        StreamInfo {
            codec_type: Some("audio".to_string()),
            bit_rate: Some("128000".to_string()),
        }
    }

    #[test]
    fn url_encodes_each_segment() {
        assert_eq!(
            delivery_url("cdn.example.com", "lectures/Course A/1 intro.mp4"),
            "https://cdn.example.com/lectures/Course%20A/1%20intro.mp4"
        );
        assert_eq!(
            delivery_url("cdn.example.com", "lectures/강의/1.mp4"),
            "https://cdn.example.com/lectures/%EA%B0%95%EC%9D%98/1.mp4"
        );
    }

    #[test]
    fn url_keeps_explicit_scheme() {
        assert_eq!(
            delivery_url("http://localhost:9000/", "a/b.mov"),
            "http://localhost:9000/a/b.mov"
        );
    }

    #[test]
    fn first_video_stream_wins() {
        let streams = vec![
            audio(),
            StreamInfo::video(Some("6000000")),
            StreamInfo::video(Some("1")),
        ];
        assert_eq!(select_video_bitrate(&streams), BitrateProbe::Available(6_000_000));
    }

    #[test]
    fn missing_shapes_are_not_errors() {
        assert_eq!(
            select_video_bitrate(&[audio()]),
            BitrateProbe::NoBitrateAvailable(NoBitrateReason::NoVideoStream)
        );
        assert_eq!(
            select_video_bitrate(&[StreamInfo::video(None)]),
            BitrateProbe::NoBitrateAvailable(NoBitrateReason::MissingBitRate)
        );
        assert_eq!(
            select_video_bitrate(&[StreamInfo::video(Some("N/A"))]),
            BitrateProbe::NoBitrateAvailable(NoBitrateReason::MissingBitRate)
        );
        assert_eq!(
            select_video_bitrate(&[StreamInfo::video(Some("fast"))]),
            BitrateProbe::NoBitrateAvailable(NoBitrateReason::UnparseableBitRate)
        );
    }

    #[test]
    fn probe_goes_through_delivery_url() {
        let config = CoreConfigBuilder::new()
            .delivery_domain("cdn.example.com")
            .build();
        let prober = MockFfprobeExecutor::new();
        prober.expect_video_bitrate("https://cdn.example.com/lectures/A/1.mp4", 6_000_000);

        let probe = probe_bitrate(&prober, &config, "lectures/A/1.mp4").unwrap();
        assert_eq!(probe, BitrateProbe::Available(6_000_000));
        assert_eq!(
            prober.get_received_calls(),
            vec!["https://cdn.example.com/lectures/A/1.mp4"]
        );
    }

    #[test]
    fn probe_failure_is_a_probe_error() {
        let config = CoreConfigBuilder::new()
            .delivery_domain("cdn.example.com")
            .build();
        let prober = MockFfprobeExecutor::new();
        prober.expect_failure("https://cdn.example.com/x.mp4", "Connection timed out");

        let err = probe_bitrate(&prober, &config, "x.mp4").unwrap_err();
        assert!(matches!(err, CoreError::Probe(ref m) if m.contains("timed out")));
    }
}
