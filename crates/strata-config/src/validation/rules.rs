//! Business rules applied after schema validation

use crate::diagnostics::{ConfigurationError, ErrorKind};
use crate::schema::{HookReference, HookTrigger, HookType, SchemaEnum};
use crate::settings::ValidatorSettings;
use crate::validation::kind::ConfigKind;
use serde_json::{Map, Value};

/// Run every rule that applies to `kind`
pub fn check_business_rules(
    file_id: &str,
    kind: ConfigKind,
    map: &Map<String, Value>,
    settings: &ValidatorSettings,
) -> Vec<ConfigurationError> {
    let mut out = check_deprecated_fields(file_id, map, settings);
    match kind {
        ConfigKind::Profile | ConfigKind::LegacyProfile => {
            out.extend(check_contexts_present(file_id, map));
            out.extend(check_profile_hooks(file_id, map));
        }
        ConfigKind::Hook => out.extend(check_hook_type_consistency(file_id, map)),
        ConfigKind::Context | ConfigKind::Unknown => {}
    }
    out
}

/// Warn about top-level keys that are no longer supported
pub fn check_deprecated_fields(
    file_id: &str,
    map: &Map<String, Value>,
    settings: &ValidatorSettings,
) -> Vec<ConfigurationError> {
    settings
        .deprecated_fields
        .iter()
        .filter(|field| map.contains_key(field.as_str()))
        .map(|field| {
            ConfigurationError::warning(
                ErrorKind::DeprecatedField,
                file_id,
                format!("Field '{}' is deprecated and will be ignored", field),
            )
        })
        .collect()
}

/// Profiles should list at least one context
pub fn check_contexts_present(file_id: &str, map: &Map<String, Value>) -> Option<ConfigurationError> {
    let empty = match map.get("contexts") {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    };
    empty.then(|| {
        ConfigurationError::warning(
            ErrorKind::EmptyContextsList,
            file_id,
            "Profile does not list any contexts",
        )
    })
}

/// Trigger keys must be known and every entry must name a hook
pub fn check_profile_hooks(file_id: &str, map: &Map<String, Value>) -> Vec<ConfigurationError> {
    let mut out = Vec::new();
    let Some(Value::Object(hooks)) = map.get("hooks") else {
        return out;
    };

    for (key, entries) in hooks {
        if HookTrigger::parse(key).is_none() {
            out.push(ConfigurationError::error(
                ErrorKind::InvalidTrigger,
                file_id,
                format!(
                    "Unknown hook trigger '{}'; expected one of: {}",
                    key,
                    HookTrigger::expected()
                ),
            ));
        }

        let entries: Vec<&Value> = match entries {
            Value::Array(items) => items.iter().collect(),
            Value::Null => Vec::new(),
            other => vec![other],
        };
        for (index, entry) in entries.into_iter().enumerate() {
            if HookReference::from_value(entry).is_none() {
                out.push(ConfigurationError::error(
                    ErrorKind::MissingHookName,
                    file_id,
                    format!("Hook entry hooks.{}[{}] must be a name or a mapping with 'name'", key, index),
                ));
            }
        }
    }
    out
}

/// A hook's `type` decides which of `context`/`script` it needs
pub fn check_hook_type_consistency(file_id: &str, map: &Map<String, Value>) -> Vec<ConfigurationError> {
    let mut out = Vec::new();
    let Some(hook_type) = map.get("type").and_then(Value::as_str).and_then(HookType::parse) else {
        return out;
    };

    let has_block = |key: &str| map.get(key).is_some_and(Value::is_object);

    if hook_type.needs_context() && !has_block("context") {
        out.push(ConfigurationError::warning(
            ErrorKind::MissingContext,
            file_id,
            format!("Hook of type '{}' has no context configuration", hook_type),
        ));
    }
    if hook_type.needs_script() && !has_block("script") {
        out.push(ConfigurationError::warning(
            ErrorKind::MissingScript,
            file_id,
            format!("Hook of type '{}' has no script configuration", hook_type),
        ));
    }
    out
}
