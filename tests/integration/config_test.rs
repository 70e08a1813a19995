use std::fs;

use kpstat::core::config::SamplerConfig;
use kpstat::KpError;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = SamplerConfig::default();
    assert_eq!(config.interval_ms, 1000);
    assert_eq!(config.gpu_history_capacity, 60);
    assert!(config.shell_fallback);
}

#[test]
fn test_config_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("kpstat.json");
    fs::write(&path, r#"{ "interval_ms": 250 }"#).unwrap();

    let config = SamplerConfig::load(&path).unwrap();
    assert_eq!(config.interval_ms, 250);
    assert_eq!(config.gpu_history_capacity, 60);
    assert!(config.shell_fallback);
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("kpstat.json");

    let config = SamplerConfig {
        interval_ms: 500,
        gpu_history_capacity: 120,
        shell_fallback: false,
    };
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    assert_eq!(SamplerConfig::load(&path).unwrap(), config);
}

#[test]
fn test_config_zero_history_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("kpstat.json");
    fs::write(&path, r#"{ "gpu_history_capacity": 0 }"#).unwrap();

    let err = SamplerConfig::load(&path).unwrap_err();
    assert!(matches!(err, KpError::Config(_)));
}

#[test]
fn test_config_malformed_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("kpstat.json");
    fs::write(&path, "{ interval_ms: ").unwrap();

    let err = SamplerConfig::load(&path).unwrap_err();
    assert!(matches!(err, KpError::Serialization(_)));
}

#[test]
fn test_config_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = SamplerConfig::load(temp_dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, KpError::Config(_)));
}
