//! Profile schema

use super::hook::{hook_entries, parse_trigger, HookReference, HookTrigger};
use super::{
    date_field, enum_field, mapping, optional_str, required_str, string_list, SchemaEnum,
    SchemaError, DEFAULT_VERSION,
};
use crate::error::ConfigResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strata_markdown::value_kind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileCategory {
    Basic,
    Professional,
    Advanced,
    Workflow,
}

impl SchemaEnum for ProfileCategory {
    const VARIANTS: &'static [Self] = &[
        ProfileCategory::Basic,
        ProfileCategory::Professional,
        ProfileCategory::Advanced,
        ProfileCategory::Workflow,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ProfileCategory::Basic => "basic",
            ProfileCategory::Professional => "professional",
            ProfileCategory::Advanced => "advanced",
            ProfileCategory::Workflow => "workflow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl SchemaEnum for Complexity {
    const VARIANTS: &'static [Self] = &[Complexity::Low, Complexity::Medium, Complexity::High];

    fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

/// A fully typed profile
///
/// Produced either by [`EnhancedProfileConfig::from_mapping`] from a YAML
/// profile file or by the merger from YAML and legacy JSON input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedProfileConfig {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProfileCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<NaiveDate>,
    pub contexts: Vec<String>,
    /// Hook references keyed by trigger, in declaration order
    pub hooks: BTreeMap<HookTrigger, Vec<HookReference>>,
    pub mcp_servers: Vec<String>,
    pub settings: Map<String, Value>,
    pub metadata: Map<String, Value>,
}

impl EnhancedProfileConfig {
    /// Empty profile with defaults for everything but the name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: DEFAULT_VERSION.to_string(),
            category: None,
            complexity: None,
            created: None,
            updated: None,
            contexts: Vec::new(),
            hooks: BTreeMap::new(),
            mcp_servers: Vec::new(),
            settings: Map::new(),
            metadata: Map::new(),
        }
    }

    /// Build a profile from a parsed mapping, collecting every violation
    ///
    /// Hook entries without a usable name and unknown trigger keys are left
    /// out of `hooks`; the validator's business rules report those.
    pub fn from_mapping(map: &Map<String, Value>) -> Result<Self, SchemaError> {
        let mut errs = SchemaError::new("profile");

        let name = required_str(map, "name", &mut errs);
        let mut config = Self::new(name);
        config.description = optional_str(map, "description", &mut errs).unwrap_or_default();
        if let Some(version) = optional_str(map, "version", &mut errs) {
            config.version = version;
        }
        config.category = enum_field(map, "category", &mut errs);
        config.complexity = enum_field(map, "complexity", &mut errs);
        config.created = date_field(map, "created", &mut errs);
        config.updated = date_field(map, "updated", &mut errs);
        config.contexts = string_list(map, "contexts", &mut errs);
        config.mcp_servers = string_list(map, "mcp_servers", &mut errs);
        config.settings = mapping(map, "settings", &mut errs);
        config.metadata = mapping(map, "metadata", &mut errs);

        match map.get("hooks") {
            None | Some(Value::Null) => {}
            Some(Value::Object(hooks)) => config.hooks = read_hook_bindings(hooks, &mut errs),
            Some(other) => errs.invalid(
                "hooks",
                format!("expected a mapping of trigger to hooks, found {}", value_kind(other)),
            ),
        }

        config.check(&mut errs);
        errs.into_result(config)
    }

    /// Re-check the invariants of an already built profile
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut errs = SchemaError::new("profile");
        if self.name.trim().is_empty() {
            errs.missing("name");
        }
        self.check(&mut errs);
        errs.into_result(())
    }

    fn check(&self, errs: &mut SchemaError) {
        for (trigger, refs) in &self.hooks {
            for (index, hook) in refs.iter().enumerate() {
                hook.check(&format!("hooks.{}[{}]", trigger.as_str(), index), errs);
            }
        }
        if let (Some(created), Some(updated)) = (self.created, self.updated) {
            if updated < created {
                errs.invalid("updated", format!("{} is earlier than created {}", updated, created));
            }
        }
    }

    /// Names of every hook referenced by this profile
    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.hooks.values().flatten().map(|h| h.name.as_str())
    }

    /// YAML-shaped mapping of this profile
    pub fn to_mapping(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Serialize as a YAML document
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Hook references grouped by trigger, skipping unknown triggers and
/// entries that carry no name
pub fn parse_hook_bindings(hooks: &Map<String, Value>) -> BTreeMap<HookTrigger, Vec<HookReference>> {
    read_hook_bindings(hooks, &mut SchemaError::new("profile"))
}

/// Like [`parse_hook_bindings`], recording bad long-form fields as
/// `hooks.<trigger>[<index>].<field>`
fn read_hook_bindings(
    hooks: &Map<String, Value>,
    errs: &mut SchemaError,
) -> BTreeMap<HookTrigger, Vec<HookReference>> {
    let mut bindings = BTreeMap::new();
    for (key, value) in hooks {
        let Some(trigger) = parse_trigger(key) else {
            continue;
        };
        let mut refs = Vec::new();
        for (index, entry) in hook_entries(value).into_iter().enumerate() {
            let mut nested = SchemaError::new("hook reference");
            if let Some(hook) = HookReference::parse_entry(entry, &mut nested) {
                refs.push(hook);
            }
            errs.absorb_nested(&format!("hooks.{}[{}]", key, index), nested);
        }
        bindings.insert(trigger, refs);
    }
    bindings
}
