//! Property-based tests for the JSON/YAML profile merger
//!
//! - Merging YAML alone never records a conflict.
//! - Merging JSON alone always marks the profile as migrated.
//! - When both define contexts, YAML wins and exactly one `contexts`
//!   conflict is recorded if they differ.

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use strata_config::{ConfigMerger, HookTrigger, SchemaEnum};

fn path_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(/[a-z]{1,8})?\\.md"
}

fn paths_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(path_strategy(), 0..5)
}

fn hook_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z-]{0,10}"
}

/// A hook entry in short or long form
fn hook_entry_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        hook_name_strategy().prop_map(Value::String),
        (hook_name_strategy(), any::<bool>())
            .prop_map(|(name, enabled)| json!({"name": name, "enabled": enabled})),
    ]
}

fn hooks_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(
        prop::sample::select(HookTrigger::VARIANTS.to_vec()),
        prop::collection::vec(hook_entry_strategy(), 0..4),
        0..4,
    )
    .prop_map(|hooks| {
        hooks
            .into_iter()
            .map(|(trigger, entries)| (trigger.as_str().to_string(), Value::Array(entries)))
            .collect()
    })
}

fn yaml_strategy() -> impl Strategy<Value = Map<String, Value>> {
    (paths_strategy(), hooks_strategy(), "[A-Za-z ]{0,20}").prop_map(|(contexts, hooks, description)| {
        let mut map = Map::new();
        map.insert("description".into(), Value::String(description));
        map.insert("contexts".into(), json!(contexts));
        map.insert("hooks".into(), Value::Object(hooks));
        map
    })
}

fn json_strategy() -> impl Strategy<Value = Map<String, Value>> {
    (paths_strategy(), hooks_strategy()).prop_map(|(paths, hooks)| {
        let mut map = Map::new();
        map.insert("paths".into(), json!(paths));
        map.insert("hooks".into(), Value::Object(hooks));
        map
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_yaml_only_never_conflicts(yaml in yaml_strategy()) {
        let mut merger = ConfigMerger::new();
        let (config, conflicts) = merger.merge(Some(&yaml), None, "p").expect("merge");

        prop_assert!(conflicts.is_empty());
        prop_assert!(merger.get_conflicts().is_empty());
        prop_assert_eq!(config.name, "p");
    }

    #[test]
    fn prop_json_only_is_migrated(json in json_strategy()) {
        let mut merger = ConfigMerger::new();
        let (config, conflicts) = merger.merge(None, Some(&json), "legacy").expect("merge");

        prop_assert!(conflicts.is_empty());
        prop_assert_eq!(&config.metadata["migrated_from_json"], &json!(true));
        prop_assert_eq!(&json!(config.contexts), &json["paths"]);
    }

    #[test]
    fn prop_yaml_contexts_win(yaml in yaml_strategy(), json in json_strategy()) {
        let mut merger = ConfigMerger::new();
        let (config, conflicts) = merger.merge(Some(&yaml), Some(&json), "p").expect("merge");

        prop_assert_eq!(&json!(config.contexts), &yaml["contexts"]);

        let context_conflicts = conflicts.iter().filter(|c| c.field_path == "contexts").count();
        let expected = usize::from(yaml["contexts"] != json["paths"]);
        prop_assert_eq!(context_conflicts, expected);
        prop_assert!(conflicts.iter().all(|c| c.field_path == "contexts" || c.field_path.starts_with("hooks.")));
    }

    /// Each trigger defined by both sides ends up with the YAML list
    #[test]
    fn prop_yaml_hooks_replace_json_lists(yaml in yaml_strategy(), json in json_strategy()) {
        let mut merger = ConfigMerger::new();
        let (config, _) = merger.merge(Some(&yaml), Some(&json), "p").expect("merge");

        let yaml_hooks = yaml["hooks"].as_object().expect("hooks object");
        for (trigger, entries) in yaml_hooks {
            let trigger = HookTrigger::parse(trigger).expect("generated trigger");
            let expected = entries.as_array().map(Vec::len).unwrap_or(0);
            prop_assert_eq!(config.hooks.get(&trigger).map(Vec::len).unwrap_or(0), expected);
        }
    }
}
