//! Merging legacy JSON profiles with YAML profiles
//!
//! YAML is authoritative wherever both sides define a field. Disagreements on
//! `contexts` and on each hook trigger are recorded as [`MergeConflict`]s.

use super::migration::{convert_hook_list, convert_hooks, convert_json_to_yaml_config};
use crate::diagnostics::{ConfigurationError, ErrorKind};
use crate::error::{ConfigError, ConfigResult};
use crate::report::{ReportBuilder, ValidationReport};
use crate::schema::EnhancedProfileConfig;
use crate::settings::ValidatorSettings;
use crate::validation::kind::ConfigKind;
use crate::validation::rules::check_business_rules;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info};

/// Which input a merged field was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeSide {
    Yaml,
    Json,
}

impl fmt::Display for MergeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeSide::Yaml => f.write_str("yaml"),
            MergeSide::Json => f.write_str("json"),
        }
    }
}

/// A field both inputs define differently
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeConflict {
    pub field_path: String,
    pub json_value: Value,
    pub yaml_value: Value,
    pub resolution: MergeSide,
}

/// Merges a YAML profile with its legacy JSON counterpart
#[derive(Debug, Default)]
pub struct ConfigMerger {
    conflicts: Vec<MergeConflict>,
}

impl ConfigMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the two inputs into one profile named `profile_name`
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingMergeInput`] when both inputs are `None`, and
    /// [`ConfigError::Schema`] when the merged mapping is not a valid profile.
    pub fn merge(
        &mut self,
        yaml: Option<&Map<String, Value>>,
        json: Option<&Map<String, Value>>,
        profile_name: &str,
    ) -> ConfigResult<(EnhancedProfileConfig, Vec<MergeConflict>)> {
        self.conflicts.clear();

        let merged = match (yaml, json) {
            (None, None) => return Err(ConfigError::missing_merge_input(profile_name)),
            (Some(yaml), None) => {
                let mut merged = yaml.clone();
                merged.insert("name".into(), Value::String(profile_name.to_string()));
                merged
            }
            (None, Some(json)) => convert_json_to_yaml_config(json, profile_name),
            (Some(yaml), Some(json)) => self.merge_both(yaml, json, profile_name),
        };

        for conflict in &self.conflicts {
            debug!(
                field = %conflict.field_path,
                resolution = %conflict.resolution,
                "Merge conflict resolved"
            );
        }
        info!(
            profile = %profile_name,
            conflicts = self.conflicts.len(),
            "Merged profile configuration"
        );

        let config = EnhancedProfileConfig::from_mapping(&merged)?;
        Ok((config, self.conflicts.clone()))
    }

    fn merge_both(
        &mut self,
        yaml: &Map<String, Value>,
        json: &Map<String, Value>,
        profile_name: &str,
    ) -> Map<String, Value> {
        let mut merged = yaml.clone();
        merged.insert("name".into(), Value::String(profile_name.to_string()));

        match (yaml.get("contexts"), json.get("paths")) {
            (Some(contexts), Some(paths)) => {
                if contexts != paths {
                    self.record("contexts", paths.clone(), contexts.clone());
                }
            }
            (None, Some(paths)) => {
                merged.insert("contexts".into(), paths.clone());
            }
            _ => {}
        }

        let mut hooks = match json.get("hooks") {
            Some(Value::Object(json_hooks)) => convert_hooks(json_hooks),
            _ => Map::new(),
        };
        if let Some(Value::Object(yaml_hooks)) = yaml.get("hooks") {
            for (trigger, list) in yaml_hooks {
                let yaml_list = convert_hook_list(list);
                if let Some(json_list) = hooks.get(trigger) {
                    if *json_list != yaml_list {
                        self.record(
                            format!("hooks.{}", trigger),
                            json_list.clone(),
                            yaml_list.clone(),
                        );
                    }
                }
                hooks.insert(trigger.clone(), yaml_list);
            }
        }
        if !hooks.is_empty() {
            merged.insert("hooks".into(), Value::Object(hooks));
        }

        for key in ["mcp_servers", "settings"] {
            if !yaml.contains_key(key) {
                if let Some(value) = json.get(key) {
                    merged.insert(key.into(), value.clone());
                }
            }
        }

        let mut metadata = yaml
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        metadata.insert("merged_from_json".into(), Value::Bool(true));
        merged.insert("metadata".into(), Value::Object(metadata));

        merged
    }

    fn record(&mut self, field_path: impl Into<String>, json_value: Value, yaml_value: Value) {
        self.conflicts.push(MergeConflict {
            field_path: field_path.into(),
            json_value,
            yaml_value,
            resolution: MergeSide::Yaml,
        });
    }

    /// Conflicts recorded by the most recent [`merge`](Self::merge)
    pub fn get_conflicts(&self) -> &[MergeConflict] {
        &self.conflicts
    }

    /// Schema and business-rule checks on a merged profile, plus one
    /// warning per conflict from the most recent merge
    pub fn validate_merged_config(&self, config: &EnhancedProfileConfig) -> ValidationReport {
        validate_merged_config(config, &self.conflicts, &ValidatorSettings::default())
    }
}

/// Identity used in reports about a merged profile
pub fn merged_source(profile_name: &str) -> String {
    format!("<merged:{}>", profile_name)
}

/// Check a merged profile and surface each conflict as a warning
pub fn validate_merged_config(
    config: &EnhancedProfileConfig,
    conflicts: &[MergeConflict],
    settings: &ValidatorSettings,
) -> ValidationReport {
    let file_id = merged_source(&config.name);
    let mut builder = ReportBuilder::new();
    builder.mark_checked(file_id.clone());

    if let Err(errs) = config.validate() {
        builder.push(ConfigurationError::error(
            ErrorKind::SchemaValidationError,
            &file_id,
            errs.to_string(),
        ));
    }
    builder.extend(check_business_rules(
        &file_id,
        ConfigKind::Profile,
        &config.to_mapping(),
        settings,
    ));

    for conflict in conflicts {
        builder.push(ConfigurationError::warning(
            ErrorKind::MergeConflict,
            &file_id,
            format!(
                "'{}' differs between JSON ({}) and YAML ({}); kept {}",
                conflict.field_path, conflict.json_value, conflict.yaml_value, conflict.resolution
            ),
        ));
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::HookTrigger;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_requires_an_input() {
        let mut merger = ConfigMerger::new();
        let err = merger.merge(None, None, "p").unwrap_err();
        assert!(matches!(err, ConfigError::MissingMergeInput { .. }));
    }

    #[test]
    fn test_yaml_contexts_win() {
        let yaml = map(json!({"name": "p", "contexts": ["new.md"]}));
        let json = map(json!({"paths": ["old.md"]}));
        let mut merger = ConfigMerger::new();

        let (config, conflicts) = merger.merge(Some(&yaml), Some(&json), "p").unwrap();

        assert_eq!(config.contexts, vec!["new.md"]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].field_path, "contexts");
        assert_eq!(conflicts[0].json_value, json!(["old.md"]));
        assert_eq!(conflicts[0].resolution, MergeSide::Yaml);
        assert_eq!(merger.get_conflicts(), conflicts.as_slice());
        assert_eq!(config.metadata["merged_from_json"], json!(true));
    }

    #[test]
    fn test_json_paths_fill_missing_contexts() {
        let yaml = map(json!({"description": "d"}));
        let json = map(json!({"paths": ["old.md"], "mcp_servers": ["fs"]}));
        let mut merger = ConfigMerger::new();

        let (config, conflicts) = merger.merge(Some(&yaml), Some(&json), "p").unwrap();

        assert_eq!(config.name, "p");
        assert_eq!(config.contexts, vec!["old.md"]);
        assert_eq!(config.mcp_servers, vec!["fs"]);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_yaml_hooks_replace_trigger_list() {
        let yaml = map(json!({
            "contexts": ["a.md"],
            "hooks": {"on_session_start": ["fmt"], "manual": ["lint"]},
        }));
        let json = map(json!({
            "hooks": {"on_session_start": ["lint", "fmt"], "manual": [{"name": "lint"}], "on_file_save": ["x"]},
        }));
        let mut merger = ConfigMerger::new();

        let (config, conflicts) = merger.merge(Some(&yaml), Some(&json), "p").unwrap();

        let names = |trigger: HookTrigger| -> Vec<String> {
            config.hooks[&trigger].iter().map(|h| h.name.clone()).collect()
        };
        assert_eq!(names(HookTrigger::OnSessionStart), vec!["fmt"]);
        assert_eq!(names(HookTrigger::Manual), vec!["lint"]);
        assert_eq!(names(HookTrigger::OnFileSave), vec!["x"]);

        let fields: Vec<&str> = conflicts.iter().map(|c| c.field_path.as_str()).collect();
        assert_eq!(fields, vec!["hooks.on_session_start"]);
    }

    #[test]
    fn test_json_only_is_migrated() {
        let json = map(json!({"paths": ["a.md"], "hooks": {"manual": ["lint"]}}));
        let mut merger = ConfigMerger::new();

        let (config, conflicts) = merger.merge(None, Some(&json), "legacy").unwrap();

        assert!(conflicts.is_empty());
        assert_eq!(config.metadata["migrated_from_json"], json!(true));
        assert_eq!(config.hooks[&HookTrigger::Manual][0].name, "lint");
    }

    #[test]
    fn test_conflicts_reset_between_merges() {
        let yaml = map(json!({"contexts": ["x.md"]}));
        let json = map(json!({"paths": ["y.md"]}));
        let mut merger = ConfigMerger::new();
        merger.merge(Some(&yaml), Some(&json), "p").unwrap();
        merger.merge(Some(&yaml), None, "p").unwrap();
        assert!(merger.get_conflicts().is_empty());
    }

    #[test]
    fn test_validate_merged_config_warns_per_conflict() {
        let yaml = map(json!({"contexts": ["x.md"], "hooks": {"manual": ["a"]}}));
        let json = map(json!({"paths": ["y.md"], "hooks": {"manual": ["b"]}}));
        let mut merger = ConfigMerger::new();
        let (config, _) = merger.merge(Some(&yaml), Some(&json), "p").unwrap();

        let report = merger.validate_merged_config(&config);
        assert!(report.is_valid);
        assert_eq!(report.of_kind(ErrorKind::MergeConflict).len(), 2);
        assert!(report.files_checked.contains("<merged:p>"));
    }

    #[test]
    fn test_validate_merged_config_flags_empty_contexts() {
        let config = EnhancedProfileConfig::new("bare");
        let report = validate_merged_config(&config, &[], &ValidatorSettings::default());
        assert!(report.is_valid);
        assert!(report.has_kind(ErrorKind::EmptyContextsList));
    }
}
