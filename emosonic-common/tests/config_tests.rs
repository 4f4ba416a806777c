//! Tests for configuration loading, validation and file resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate EMOSONIC_CONFIG are marked with #[serial].

use emosonic_common::config::{resolve_config_path, InstallationConfig, CONFIG_ENV_VAR};
use emosonic_common::{Emotion, FadeCurve};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[test]
fn test_empty_document_yields_defaults() {
    let config = InstallationConfig::from_toml_str("").unwrap();
    assert_eq!(config.frame_rate, 30);
    assert_eq!(config.audio.fade_out(), Duration::from_secs(2));
    assert_eq!(config.audio.forced_fade_out(), Duration::from_millis(100));
    assert_eq!(config.audio.fade_in_curve, FadeCurve::Linear);
    assert_eq!(config.audio.fade_out_curve, FadeCurve::Exponential);
    assert_eq!(config.estimator.detection_timeout(), Duration::from_secs(1));
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_partial_sections_keep_other_defaults() {
    let toml = r#"
        frame_rate = 25

        [estimator]
        smoothing_window = 5

        [audio]
        fade_in_secs = 0.5
        fade_out_curve = "s_curve"

        [audio.secondary]
        min_confidence = 0.1
        max_confidence = 0.7
        pan = -0.4
    "#;
    let config = InstallationConfig::from_toml_str(toml).unwrap();

    assert_eq!(config.frame_rate, 25);
    assert_eq!(config.estimator.smoothing_window, 5);
    assert_eq!(config.estimator.detection_timeout_ms, 1000);
    assert_eq!(config.audio.fade_in(), Duration::from_millis(500));
    assert_eq!(config.audio.fade_out_secs, 2.0);
    assert_eq!(config.audio.fade_out_curve, FadeCurve::SCurve);
    assert_eq!(config.audio.secondary.pan, -0.4);
    assert!(config.audio.secondary.accepts(0.1));
    assert!(!config.audio.secondary.accepts(0.7));
    // Untouched primary gate
    assert!(config.audio.primary.accepts(0.8));
}

#[test]
fn test_emotion_table_replaces_defaults() {
    let toml = r#"
        [emotions.happy]
        samples = ["birds.wav", "chimes.wav"]
        primary_gain = 1.1

        [emotions.sad]
        samples = ["cello.wav"]
    "#;
    let config = InstallationConfig::from_toml_str(toml).unwrap();

    assert_eq!(config.emotions.len(), 2);
    let happy = &config.emotions[&Emotion::Happy];
    assert_eq!(happy.samples, vec![PathBuf::from("birds.wav"), PathBuf::from("chimes.wav")]);
    assert_eq!(happy.primary_gain, 1.1);
    assert_eq!(happy.secondary_gain, 1.0);
    assert!(!config.emotions.contains_key(&Emotion::Neutral));
}

#[test]
fn test_unknown_emotion_label_rejected() {
    let toml = r#"
        [emotions.joy]
        samples = ["x.wav"]
    "#;
    assert!(InstallationConfig::from_toml_str(toml).is_err());
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases = [
        "frame_rate = 0",
        "[estimator]\nsmoothing_window = 0",
        "[audio]\nfade_out_secs = -1.0",
        "[audio]\nfade_out_secs = 1e20",
        "[audio]\nfade_in_secs = 3600.5",
        "[audio]\ncrossfade_secs = 1e300",
        "[audio]\nfade_floor = 0.0",
        "[audio]\nmaster_volume = 1.5",
        "[audio.primary]\nmin_confidence = 0.8\nmax_confidence = 0.8",
        "[audio.secondary]\nmin_confidence = 0.05\npan = 2.0",
        "[emotions.happy]\nprimary_gain = -0.5",
    ];
    for case in cases {
        assert!(
            InstallationConfig::from_toml_str(case).is_err(),
            "expected rejection for {:?}",
            case
        );
    }
}

#[test]
fn test_longest_fade_accepted() {
    let config = InstallationConfig::from_toml_str("[audio]\nfade_out_secs = 3600.0").unwrap();
    assert_eq!(config.audio.fade_out(), Duration::from_secs(3600));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "frame_rate = 60\n[logging]\nlevel = \"debug\"").unwrap();

    let config = InstallationConfig::load(Some(&path)).unwrap();
    assert_eq!(config.frame_rate, 60);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.frame_interval(), Duration::from_secs_f64(1.0 / 60.0));
}

#[test]
fn test_load_missing_file_is_error() {
    let result = InstallationConfig::load(Some(Path::new("/nonexistent/emosonic.toml")));
    assert!(result.is_err());
}

#[test]
fn test_load_none_uses_defaults() {
    let config = InstallationConfig::load(None).unwrap();
    assert_eq!(config.emotions.len(), Emotion::COUNT);
}

#[test]
#[serial]
fn test_cli_argument_has_priority() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")), CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-cli.toml")));
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_empty_env_var_ignored() {
    env::set_var(CONFIG_ENV_VAR, "");
    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    // Falls through to the user config dir, which only applies if it exists
    if let Some(path) = resolved {
        assert!(path.ends_with("emosonic/config.toml"));
        assert!(path.exists());
    }
    env::remove_var(CONFIG_ENV_VAR);
}
