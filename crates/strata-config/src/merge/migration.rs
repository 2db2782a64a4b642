//! Conversion of legacy JSON profiles into the YAML profile shape

use crate::schema::hook::hook_entries;
use crate::schema::{HookReference, HookTrigger, SchemaEnum, DEFAULT_VERSION};
use chrono::Local;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

/// Legacy keys carried into the converted profile
const CARRIED_KEYS: [&str; 9] = [
    "name",
    "description",
    "version",
    "paths",
    "contexts",
    "hooks",
    "mcp_servers",
    "settings",
    "metadata",
];

/// Convert one legacy hook list to long-form references
///
/// Entries that name no hook are kept untouched so validation can report
/// them. Long-form entries keep their own values, with `enabled` and
/// `config` filled in when absent.
pub fn convert_hook_list(value: &Value) -> Value {
    Value::Array(
        hook_entries(value)
            .into_iter()
            .map(|entry| match (entry, HookReference::from_value(entry)) {
                (Value::Object(map), Some(_)) => {
                    let mut long = map.clone();
                    long.entry("enabled").or_insert(Value::Bool(true));
                    long.entry("config").or_insert_with(|| Value::Object(Map::new()));
                    Value::Object(long)
                }
                (_, Some(hook)) => hook.to_value(),
                (_, None) => entry.clone(),
            })
            .collect(),
    )
}

/// Convert a legacy `hooks` mapping trigger by trigger
pub fn convert_hooks(hooks: &Map<String, Value>) -> Map<String, Value> {
    hooks
        .iter()
        .map(|(trigger, list)| (trigger.clone(), convert_hook_list(list)))
        .collect()
}

/// Turn a legacy JSON profile into a YAML-shaped profile mapping
///
/// `paths` becomes `contexts`, hooks are rewritten in long form, and
/// `metadata` records the migration. The result is not schema-checked.
pub fn convert_json_to_yaml_config(json: &Map<String, Value>, profile_name: &str) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("name".into(), Value::String(profile_name.to_string()));
    if let Some(description) = json.get("description") {
        out.insert("description".into(), description.clone());
    }
    out.insert(
        "version".into(),
        json.get("version")
            .cloned()
            .unwrap_or_else(|| Value::String(DEFAULT_VERSION.to_string())),
    );

    let contexts = json
        .get("paths")
        .or_else(|| json.get("contexts"))
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));
    out.insert("contexts".into(), contexts);

    if let Some(Value::Object(hooks)) = json.get("hooks") {
        out.insert("hooks".into(), Value::Object(convert_hooks(hooks)));
    }
    for key in ["mcp_servers", "settings"] {
        if let Some(value) = json.get(key) {
            out.insert(key.into(), value.clone());
        }
    }

    let mut metadata = json
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    metadata.insert("migrated_from_json".into(), Value::Bool(true));
    metadata.insert(
        "migration_date".into(),
        Value::String(Local::now().format("%Y-%m-%d").to_string()),
    );
    out.insert("metadata".into(), Value::Object(metadata));

    info!(profile = %profile_name, "Converted legacy JSON profile");
    out
}

/// Advisory summary of a legacy profile conversion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub profile_name: String,
    pub changes_made: Vec<String>,
    pub recommendations: Vec<String>,
}

impl MigrationReport {
    pub fn to_mapping(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Describe what a conversion changed and what the user should still do
pub fn create_migration_report(
    original: &Map<String, Value>,
    converted: &Map<String, Value>,
    profile_name: &str,
) -> MigrationReport {
    let mut changes = Vec::new();
    let mut recommendations = Vec::new();

    if original.get("name").and_then(Value::as_str) != Some(profile_name) {
        changes.push(format!("Set name to '{}'", profile_name));
    }
    if !original.contains_key("version") {
        if let Some(version) = converted.get("version").and_then(Value::as_str) {
            changes.push(format!("Added version {}", version));
        }
    }
    if let Some(Value::Array(paths)) = original.get("paths") {
        changes.push(format!("Renamed 'paths' to 'contexts' ({} entries)", paths.len()));
    }

    if let Some(Value::Object(hooks)) = converted.get("hooks") {
        let count: usize = hooks.values().map(|list| hook_entries(list).len()).sum();
        changes.push(format!(
            "Converted {} hook reference(s) under {} trigger(s) to long form",
            count,
            hooks.len()
        ));
        for trigger in hooks.keys().filter(|k| HookTrigger::parse(k).is_none()) {
            recommendations.push(format!(
                "Rename hook trigger '{}' to one of: {}",
                trigger,
                HookTrigger::expected()
            ));
        }
    }

    for key in original.keys() {
        if !CARRIED_KEYS.contains(&key.as_str()) {
            changes.push(format!("Dropped unsupported field '{}'", key));
        }
    }
    changes.push("Marked metadata.migrated_from_json".to_string());

    let has_description = converted
        .get("description")
        .and_then(Value::as_str)
        .is_some_and(|d| !d.trim().is_empty());
    if !has_description {
        recommendations.push("Add a description field".to_string());
    }
    let has_contexts = converted
        .get("contexts")
        .and_then(Value::as_array)
        .is_some_and(|c| !c.is_empty());
    if !has_contexts {
        recommendations.push("List at least one context file under 'contexts'".to_string());
    }
    if !converted.contains_key("category") {
        recommendations.push(
            "Set a category (basic, professional, advanced or workflow)".to_string(),
        );
    }

    MigrationReport {
        profile_name: profile_name.to_string(),
        changes_made: changes,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_convert_json_to_yaml_config() {
        let json = map(json!({
            "paths": ["contexts/a.md"],
            "hooks": {"on_session_start": ["lint", {"name": "fmt", "enabled": false}]},
            "mcp_servers": ["fs"],
        }));
        let converted = convert_json_to_yaml_config(&json, "legacy");

        assert_eq!(converted["name"], json!("legacy"));
        assert_eq!(converted["version"], json!(DEFAULT_VERSION));
        assert_eq!(converted["contexts"], json!(["contexts/a.md"]));
        assert_eq!(
            converted["hooks"]["on_session_start"],
            json!([
                {"name": "lint", "enabled": true, "config": {}},
                {"name": "fmt", "enabled": false, "config": {}},
            ])
        );
        assert_eq!(converted["metadata"]["migrated_from_json"], json!(true));
        let date = converted["metadata"]["migration_date"].as_str().unwrap();
        assert!(chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn test_nameless_hook_entry_kept() {
        let converted = convert_hook_list(&json!([{"enabled": true}, "ok"]));
        assert_eq!(converted[0], json!({"enabled": true}));
        assert_eq!(converted[1]["name"], json!("ok"));
    }

    #[test]
    fn test_migration_report() {
        let original = map(json!({
            "paths": ["a.md", "b.md"],
            "hooks": {"on_start": ["x"]},
            "theme": "dark",
        }));
        let converted = convert_json_to_yaml_config(&original, "p");
        let report = create_migration_report(&original, &converted, "p");

        assert_eq!(report.profile_name, "p");
        assert!(report.changes_made.iter().any(|c| c.contains("'paths' to 'contexts' (2 entries)")));
        assert!(report.changes_made.iter().any(|c| c.contains("'theme'")));
        assert!(report.recommendations.iter().any(|r| r == "Add a description field"));
        assert!(report.recommendations.iter().any(|r| r.contains("'on_start'")));
        assert!(!report.recommendations.iter().any(|r| r.contains("context file")));
    }
}
