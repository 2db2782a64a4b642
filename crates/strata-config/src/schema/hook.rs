//! Hook schema

use super::{
    bool_field, bounded_int, mapping, optional_str, required_enum, required_str,
    string_list, SchemaEnum, SchemaError, DEFAULT_VERSION,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use strata_markdown::{parse_priority, value_kind};

/// Lowest accepted hook timeout, in seconds
pub const MIN_HOOK_TIMEOUT: u64 = 1;
/// Highest accepted hook timeout, in seconds
pub const MAX_HOOK_TIMEOUT: u64 = 300;
pub const DEFAULT_HOOK_TIMEOUT: u64 = 30;

/// What a hook does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    /// Inject context files
    Context,
    /// Run a script
    Script,
    /// Both of the above
    Hybrid,
    /// Unattended script run
    Automation,
}

impl SchemaEnum for HookType {
    const VARIANTS: &'static [Self] = &[
        HookType::Context,
        HookType::Script,
        HookType::Hybrid,
        HookType::Automation,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            HookType::Context => "context",
            HookType::Script => "script",
            HookType::Hybrid => "hybrid",
            HookType::Automation => "automation",
        }
    }
}

impl HookType {
    pub fn needs_context(&self) -> bool {
        matches!(self, HookType::Context | HookType::Hybrid)
    }

    pub fn needs_script(&self) -> bool {
        matches!(
            self,
            HookType::Script | HookType::Hybrid | HookType::Automation
        )
    }
}

/// Event a hook is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookTrigger {
    OnSessionStart,
    PerUserMessage,
    OnFileChange,
    OnProfileSwitch,
    OnFileSave,
    Manual,
}

impl SchemaEnum for HookTrigger {
    const VARIANTS: &'static [Self] = &[
        HookTrigger::OnSessionStart,
        HookTrigger::PerUserMessage,
        HookTrigger::OnFileChange,
        HookTrigger::OnProfileSwitch,
        HookTrigger::OnFileSave,
        HookTrigger::Manual,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            HookTrigger::OnSessionStart => "on_session_start",
            HookTrigger::PerUserMessage => "per_user_message",
            HookTrigger::OnFileChange => "on_file_change",
            HookTrigger::OnProfileSwitch => "on_profile_switch",
            HookTrigger::OnFileSave => "on_file_save",
            HookTrigger::Manual => "manual",
        }
    }
}

impl fmt::Display for HookTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a context hook pulls its files from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextSourceConfig {
    pub sources: Vec<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub priority: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<u64>,
}

impl ContextSourceConfig {
    fn from_mapping(map: &Map<String, Value>) -> Result<Self, SchemaError> {
        let mut errs = SchemaError::new("context");
        let sources = string_list(map, "sources", &mut errs);
        let tags = string_list(map, "tags", &mut errs);
        let categories = string_list(map, "categories", &mut errs);
        let priority = parse_priority(map.get("priority"));
        let cache_ttl = match map.get("cache_ttl") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) if n.as_u64().is_some() => n.as_u64(),
            Some(other) => {
                errs.invalid(
                    "cache_ttl",
                    format!("expected a non-negative integer, found {}", value_kind(other)),
                );
                None
            }
        };

        errs.into_result(Self {
            sources,
            tags,
            categories,
            priority,
            cache_ttl,
        })
    }
}

/// Script a hook runs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScriptConfig {
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ScriptConfig {
    fn from_mapping(map: &Map<String, Value>) -> Result<Self, SchemaError> {
        let mut errs = SchemaError::new("script");
        let command = required_str(map, "command", &mut errs);
        let args = string_list(map, "args", &mut errs);
        let working_dir = optional_str(map, "working_dir", &mut errs);
        let timeout = bounded_int(map, "timeout", MIN_HOOK_TIMEOUT, MAX_HOOK_TIMEOUT, &mut errs);

        let mut env = BTreeMap::new();
        for (key, value) in mapping(map, "env", &mut errs) {
            match value {
                Value::String(s) => {
                    env.insert(key, s);
                }
                Value::Number(_) | Value::Bool(_) => {
                    env.insert(key, value.to_string());
                }
                other => errs.invalid(
                    format!("env.{}", key),
                    format!("expected a scalar, found {}", value_kind(&other)),
                ),
            }
        }

        errs.into_result(Self {
            command,
            args,
            env,
            working_dir,
            timeout,
        })
    }
}

/// A fully typed hook definition file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookConfig {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(rename = "type")]
    pub hook_type: HookType,
    pub trigger: HookTrigger,
    pub timeout: u64,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextSourceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptConfig>,
    pub conditions: Vec<Value>,
    pub metadata: Map<String, Value>,
}

impl HookConfig {
    /// Build a hook from a parsed YAML mapping, collecting every violation
    pub fn from_mapping(map: &Map<String, Value>) -> Result<Self, SchemaError> {
        let mut errs = SchemaError::new("hook");

        let name = required_str(map, "name", &mut errs);
        let description = optional_str(map, "description", &mut errs).unwrap_or_default();
        let version = optional_str(map, "version", &mut errs)
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let hook_type = required_enum::<HookType>(map, "type", &mut errs);
        let trigger = required_enum::<HookTrigger>(map, "trigger", &mut errs);
        let timeout = bounded_int(map, "timeout", MIN_HOOK_TIMEOUT, MAX_HOOK_TIMEOUT, &mut errs)
            .unwrap_or(DEFAULT_HOOK_TIMEOUT);
        let enabled = bool_field(map, "enabled", true, &mut errs);

        let context = match map.get("context") {
            None | Some(Value::Null) => None,
            Some(Value::Object(m)) => match ContextSourceConfig::from_mapping(m) {
                Ok(c) => Some(c),
                Err(nested) => {
                    errs.absorb_nested("context", nested);
                    None
                }
            },
            Some(other) => {
                errs.invalid("context", format!("expected a mapping, found {}", value_kind(other)));
                None
            }
        };

        let script = match map.get("script") {
            None | Some(Value::Null) => None,
            Some(Value::Object(m)) => match ScriptConfig::from_mapping(m) {
                Ok(s) => Some(s),
                Err(nested) => {
                    errs.absorb_nested("script", nested);
                    None
                }
            },
            Some(other) => {
                errs.invalid("script", format!("expected a mapping, found {}", value_kind(other)));
                None
            }
        };

        let conditions = match map.get("conditions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                errs.invalid("conditions", format!("expected a list, found {}", value_kind(other)));
                Vec::new()
            }
        };
        let metadata = mapping(map, "metadata", &mut errs);

        match (hook_type, trigger) {
            (Some(hook_type), Some(trigger)) if errs.is_empty() => Ok(Self {
                name,
                description,
                version,
                hook_type,
                trigger,
                timeout,
                enabled,
                context,
                script,
                conditions,
                metadata,
            }),
            _ => Err(errs),
        }
    }
}

/// A profile's pointer to a hook, bound under a trigger
///
/// Accepted as a bare name (`- lint`) or as a mapping
/// (`- {name: lint, enabled: false, timeout: 10}`); always written back in
/// the mapping form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookReference {
    pub name: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    pub config: Map<String, Value>,
}

impl HookReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            timeout: None,
            config: Map::new(),
        }
    }

    /// Parse either form. Returns `None` when the entry has no usable name.
    ///
    /// Long-form fields with the wrong type fall back to their defaults; use
    /// [`from_mapping`](Self::from_mapping) to have them reported.
    pub fn from_value(value: &Value) -> Option<Self> {
        let mut ignored = SchemaError::new("hook reference");
        Self::parse_entry(value, &mut ignored)
    }

    /// Parse the long form, collecting every invalid field
    pub fn from_mapping(map: &Map<String, Value>) -> Result<Self, SchemaError> {
        let mut errs = SchemaError::new("hook reference");
        let name = required_str(map, "name", &mut errs);
        let hook = Self {
            name: name.trim().to_string(),
            enabled: bool_field(map, "enabled", true, &mut errs),
            timeout: bounded_int(map, "timeout", MIN_HOOK_TIMEOUT, MAX_HOOK_TIMEOUT, &mut errs),
            config: mapping(map, "config", &mut errs),
        };
        errs.into_result(hook)
    }

    /// Parse either form, recording long-form violations in `errs`
    ///
    /// An entry that names a hook is returned even when other fields are
    /// invalid, so bindings stay linkable while the errors are reported.
    pub(crate) fn parse_entry(value: &Value, errs: &mut SchemaError) -> Option<Self> {
        match value {
            Value::String(name) if !name.trim().is_empty() => Some(Self::new(name.trim())),
            Value::Object(map) => {
                let name = map.get("name").and_then(Value::as_str)?.trim();
                if name.is_empty() {
                    return None;
                }
                Some(Self {
                    name: name.to_string(),
                    enabled: bool_field(map, "enabled", true, errs),
                    timeout: bounded_int(map, "timeout", MIN_HOOK_TIMEOUT, MAX_HOOK_TIMEOUT, errs),
                    config: mapping(map, "config", errs),
                })
            }
            _ => None,
        }
    }

    /// Long-form mapping of this reference
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub(crate) fn check(&self, field: &str, errs: &mut SchemaError) {
        if let Some(timeout) = self.timeout {
            if !(MIN_HOOK_TIMEOUT..=MAX_HOOK_TIMEOUT).contains(&timeout) {
                errs.invalid(
                    format!("{}.timeout", field),
                    format!(
                        "{} is out of range [{}, {}]",
                        timeout, MIN_HOOK_TIMEOUT, MAX_HOOK_TIMEOUT
                    ),
                );
            }
        }
    }
}

/// Parse a trigger key such as `on_session_start`
pub fn parse_trigger(key: &str) -> Option<HookTrigger> {
    HookTrigger::parse(key)
}

/// Hook entries listed under one trigger; a lone entry counts as a list of one
pub(crate) fn hook_entries(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
