use bitcap_core::config::CoreConfig;
use std::env;
use std::path::PathBuf;

// Only test in this binary that touches the process environment.
#[test]
fn test_env_var_overrides() {
    // SAFETY: no other test in this binary reads or writes the environment.
    unsafe {
        env::set_var("BITCAP_BUCKET", "env-bucket");
        env::set_var("BITCAP_BITRATE_THRESHOLD", "8000000");
        env::set_var("BITCAP_DRY_RUN", "true");
        env::set_var("BITCAP_FOLDERS", "course 1, course 2,");
        env::set_var("BITCAP_FFMPEG_PATH", "/opt/homebrew/bin/ffmpeg");
        env::set_var("BITCAP_TARGET_BITRATE", "not-a-number");
    }

    let config = CoreConfig::default().with_env_overrides();

    assert_eq!(config.bucket, "env-bucket");
    assert_eq!(config.bitrate_threshold, 8_000_000);
    assert!(config.dry_run);
    assert_eq!(config.folders, vec!["course 1", "course 2"]);
    assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/homebrew/bin/ffmpeg"));
    // Unparseable numbers keep the previous value
    assert_eq!(config.target_bitrate, 4_000_000);

    unsafe {
        for key in [
            "BITCAP_BUCKET",
            "BITCAP_BITRATE_THRESHOLD",
            "BITCAP_DRY_RUN",
            "BITCAP_FOLDERS",
            "BITCAP_FFMPEG_PATH",
            "BITCAP_TARGET_BITRATE",
        ] {
            env::remove_var(key);
        }
    }
}
