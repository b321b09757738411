use std::io::Write;

use qsoscore::{
    config::{ConfigError, ScoringConfig, Settings},
    engine::dupes::TimeComparison,
    handlers::activity::{AccumulationStyle, Dimension},
    operation::Operation,
    types::Band,
};

const CONFIG: &str = r#"{
    "settings": {
        "primary_country": "K",
        "disabled_hunting": ["sota"]
    },
    "activities": [
        {
            "key": "pota",
            "activation_type": "potaActivation",
            "hunting_type": "pota",
            "unique_per": ["day", "band", "mode"],
            "qsos_to_activate": 10,
            "labels": { "short": "POTA", "icon": "tree" }
        },
        {
            "key": "sota",
            "activation_type": "sotaActivation",
            "hunting_type": "sota",
            "unique_per": ["day"],
            "qsos_to_activate": 4,
            "accumulation": "operation",
            "valid_bands": ["20m", "40m"]
        }
    ]
}"#;

#[test]
fn parses_settings_and_descriptors() {
    let config = ScoringConfig::from_json_str(CONFIG).expect("config");

    assert_eq!(config.settings.secondary_country, "VE");
    assert!(config.settings.general_hunting);
    assert_eq!(config.settings.default_time_comparison, TimeComparison::Inclusive);
    assert!(!config.settings.hunting_enabled_for("sota"));

    let pota = &config.activities[0];
    assert_eq!(pota.unique_per, vec![Dimension::Day, Dimension::Band, Dimension::Mode]);
    assert_eq!(pota.accumulation, AccumulationStyle::Day);
    assert!(pota.general_hunting);
    assert_eq!(pota.labels.icon.as_deref(), Some("tree"));

    let sota = &config.activities[1];
    assert_eq!(sota.accumulation, AccumulationStyle::Operation);
    assert_eq!(sota.valid_bands, Some(vec![Band::B20m, Band::B40m]));
}

#[test]
fn built_registry_honors_disabled_hunting() {
    let config = ScoringConfig::from_json_str(CONFIG).expect("config");
    let registry = config.build_registry().expect("registry");
    let keys: Vec<String> = registry
        .resolve_handlers(&Operation::default(), &config.settings)
        .iter()
        .map(|r| r.score_key().to_string())
        .collect();

    assert_eq!(keys.len(), 6);
    assert_eq!(keys[..2], ["defaultOperation", "pota"]);
}

#[test]
fn empty_config_uses_defaults() {
    let config = ScoringConfig::from_json_str("{}").expect("config");
    assert_eq!(config.settings, Settings::default());
    assert!(config.activities.is_empty());
}

#[test]
fn invalid_descriptors_are_rejected() {
    let same_types = r#"{"activities":[{"key":"x","activation_type":"x","hunting_type":"x"}]}"#;
    assert!(matches!(
        ScoringConfig::from_json_str(same_types),
        Err(ConfigError::InvalidDescriptor { ref key, .. }) if key == "x"
    ));

    let ref_without_hunting =
        r#"{"activities":[{"key":"x","activation_type":"xa","unique_per":["ref"]}]}"#;
    assert!(matches!(
        ScoringConfig::from_json_str(ref_without_hunting),
        Err(ConfigError::InvalidDescriptor { .. })
    ));

    let repeated =
        r#"{"activities":[{"key":"x","activation_type":"xa","unique_per":["band","band"]}]}"#;
    assert!(matches!(
        ScoringConfig::from_json_str(repeated),
        Err(ConfigError::InvalidDescriptor { .. })
    ));

    assert!(matches!(
        ScoringConfig::from_json_str("{not json"),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(CONFIG.as_bytes()).expect("write");
    file.flush().expect("flush");

    let config = ScoringConfig::from_path(file.path()).expect("config");
    assert_eq!(config.activities.len(), 2);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = ScoringConfig::from_path(dir.path().join("absent.json")).expect_err("missing");
    assert!(matches!(err, ConfigError::Io(_)));
}
