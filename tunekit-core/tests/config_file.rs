use std::fs;

use tunekit_core::{TargetMode, TunerConfig, TunerError, tuning};

#[test]
fn save_then_load_keeps_tuning_and_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tunekit.json");

    let mut config = TunerConfig::with_preset("guitar-drop-d").unwrap();
    config.reference_pitch = 442.0;
    config.mode = TargetMode::Manual { index: 0 };
    config.save(&path).unwrap();

    let loaded = TunerConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.tuning.unwrap().targets[0].label, "D2");
}

#[test]
fn load_rejects_invalid_contents() {
    let dir = tempfile::tempdir().unwrap();

    let empty_table = dir.path().join("empty.json");
    fs::write(&empty_table, r#"{ "tuning": { "name": "none", "targets": [] } }"#).unwrap();
    assert!(matches!(
        TunerConfig::load(&empty_table),
        Err(TunerError::EmptyTuningTable(_))
    ));

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, "not json").unwrap();
    assert!(matches!(TunerConfig::load(&garbage), Err(TunerError::Json(_))));

    assert!(matches!(
        TunerConfig::load(dir.path().join("missing.json")),
        Err(TunerError::Io(_))
    ));
}

#[test]
fn preset_config_uses_table_targets() {
    let config = TunerConfig::with_preset("ukulele-standard").unwrap();
    assert_eq!(config.tuning, Some(tuning::preset("ukulele-standard").unwrap()));
    assert!(TunerConfig::with_preset("sitar").is_err());
}
