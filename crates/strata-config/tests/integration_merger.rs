//! Integration tests for merging legacy JSON profiles with YAML profiles

use serde_json::{json, Map, Value};
use std::fs;
use strata_config::{
    create_migration_report, ConfigError, ConfigMerger, ConfigValidator, ErrorKind, HookTrigger,
    MergeSide, ValidatorSettings,
};
use tempfile::TempDir;

fn mapping(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

fn load_yaml(source: &str) -> Map<String, Value> {
    serde_yaml::from_str(source).expect("valid yaml")
}

fn load_json(source: &str) -> Map<String, Value> {
    serde_json::from_str(source).expect("valid json")
}

#[test]
fn test_merge_files_from_disk() {
    let yaml = load_yaml(
        "name: rust\ndescription: Rust work\ncontexts:\n  - contexts/style.md\nhooks:\n  on_session_start: [inject-style]\n",
    );
    let json = load_json(
        r#"{"paths": ["contexts/old.md"], "hooks": {"on_session_start": ["legacy-inject"], "on_file_save": [{"name": "fmt", "timeout": 15}]}, "mcp_servers": ["filesystem"]}"#,
    );

    let mut merger = ConfigMerger::new();
    let (config, conflicts) = merger.merge(Some(&yaml), Some(&json), "rust").expect("merge");

    assert_eq!(config.description, "Rust work");
    assert_eq!(config.contexts, vec!["contexts/style.md"]);
    assert_eq!(config.mcp_servers, vec!["filesystem"]);
    assert_eq!(config.hooks[&HookTrigger::OnFileSave][0].timeout, Some(15));
    assert_eq!(config.hooks[&HookTrigger::OnSessionStart][0].name, "inject-style");

    let fields: Vec<&str> = conflicts.iter().map(|c| c.field_path.as_str()).collect();
    assert_eq!(fields, vec!["contexts", "hooks.on_session_start"]);
    assert!(conflicts.iter().all(|c| c.resolution == MergeSide::Yaml));

    let report = merger.validate_merged_config(&config);
    assert!(report.is_valid);
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings.iter().all(|w| w.kind == ErrorKind::MergeConflict));
}

#[test]
fn test_identical_sides_do_not_conflict() {
    let yaml = mapping(json!({"contexts": ["a.md"], "hooks": {"manual": ["lint"]}}));
    let json = mapping(json!({"paths": ["a.md"], "hooks": {"manual": [{"name": "lint", "enabled": true}]}}));

    let mut merger = ConfigMerger::new();
    let (_, conflicts) = merger.merge(Some(&yaml), Some(&json), "p").expect("merge");
    assert!(conflicts.is_empty());
}

#[test]
fn test_mcp_and_settings_prefer_yaml_silently() {
    let yaml = mapping(json!({"contexts": ["a.md"], "mcp_servers": ["git"], "settings": {"mode": "fast"}}));
    let json = mapping(json!({"mcp_servers": ["filesystem"], "settings": {"mode": "slow"}}));

    let mut merger = ConfigMerger::new();
    let (config, conflicts) = merger.merge(Some(&yaml), Some(&json), "p").expect("merge");

    assert_eq!(config.mcp_servers, vec!["git"]);
    assert_eq!(config.settings["mode"], json!("fast"));
    assert!(conflicts.is_empty());
}

#[test]
fn test_invalid_yaml_fields_fail_the_merge() {
    let yaml = mapping(json!({"category": "legendary"}));
    let mut merger = ConfigMerger::new();

    let err = merger.merge(Some(&yaml), None, "p").expect_err("schema error");
    match err {
        ConfigError::Schema(schema) => assert!(schema.mentions("category")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_migrated_profile_validates_on_disk() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("contexts")).expect("mkdir");
    fs::create_dir_all(dir.path().join("profiles")).expect("mkdir");
    fs::write(
        dir.path().join("contexts/a.md"),
        "A context body that is comfortably longer than fifty characters in total.",
    )
    .expect("write context");

    let json = mapping(json!({"paths": ["contexts/a.md"], "hooks": {"manual": ["lint"]}, "theme": "dark"}));
    let mut merger = ConfigMerger::new();
    let (config, _) = merger.merge(None, Some(&json), "legacy").expect("merge");

    let migration = create_migration_report(&json, &config.to_mapping(), "legacy");
    assert!(migration.changes_made.iter().any(|c| c.contains("'theme'")));

    let yaml = config.to_yaml().expect("to yaml");
    fs::write(dir.path().join("profiles/legacy.yaml"), yaml).expect("write profile");

    let validator = ConfigValidator::with_settings(dir.path(), ValidatorSettings::default());
    let report = validator.validate_file(dir.path().join("profiles/legacy.yaml"));
    assert!(report.is_valid, "{:?}", report.errors);
}

#[test]
fn test_legacy_hook_fields_survive_migration_checks() {
    let json = mapping(json!({"paths": ["a.md"], "hooks": {"manual": [{"name": "lint", "timeout": -5}]}}));
    let mut merger = ConfigMerger::new();

    let err = merger.merge(None, Some(&json), "legacy").expect_err("bad timeout");
    match err {
        ConfigError::Schema(schema) => assert!(schema.mentions("hooks.manual[0].timeout")),
        other => panic!("unexpected error: {other}"),
    }
}
