//! Validator settings and environment overrides
//!
//! Settings come from defaults, optionally a YAML file, then environment
//! variables with the `STRATA_` prefix.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "STRATA_";

/// Tunables for the configuration validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorSettings {
    /// Top-level keys reported as deprecated
    pub deprecated_fields: Vec<String>,
    /// Minimum trimmed length of a context body
    pub min_context_length: usize,
    /// Warn when a glob reference matches nothing
    pub warn_on_unmatched_globs: bool,
    /// File-name globs skipped during discovery
    pub exclude: Vec<String>,
    pub follow_links: bool,
    /// Extensions that mark a `script.command` as a file path
    pub script_extensions: Vec<String>,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            deprecated_fields: strings(&["legacy_hooks", "old_context_format", "json_config"]),
            min_context_length: 50,
            warn_on_unmatched_globs: true,
            exclude: strings(&["README.md", "CHANGELOG.md", "LICENSE*"]),
            follow_links: false,
            script_extensions: strings(&["sh", "bash", "zsh", "py", "js", "ts", "rb", "pl"]),
        }
    }
}

impl ValidatorSettings {
    /// Load settings from a YAML file; absent keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::settings(format!("{}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded validator settings");
        Ok(settings)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        EnvOverrides::apply(&mut settings);
        settings
    }

    /// Whether `ext` is a known script extension
    pub fn is_script_extension(&self, ext: &str) -> bool {
        self.script_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext.trim_start_matches('.')))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Environment variable overrides
pub struct EnvOverrides;

impl EnvOverrides {
    /// Collect `STRATA_*` variables as `setting_name -> value`
    ///
    /// `STRATA_MIN_CONTEXT_LENGTH=80` becomes `{"min_context_length": "80"}`.
    pub fn parse() -> HashMap<String, String> {
        Self::parse_vars(std::env::vars())
    }

    fn parse_vars(vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
        vars.into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|name| (name.to_lowercase(), value))
            })
            .collect()
    }

    /// Apply the current environment to `settings`
    pub fn apply(settings: &mut ValidatorSettings) {
        let overrides = Self::parse();
        Self::apply_overrides(settings, &overrides);
    }

    /// Apply specific overrides; invalid values are ignored with a warning
    pub fn apply_overrides(settings: &mut ValidatorSettings, overrides: &HashMap<String, String>) {
        for (name, value) in overrides {
            match name.as_str() {
                "min_context_length" => match value.trim().parse::<usize>() {
                    Ok(n) => settings.min_context_length = n,
                    Err(_) => warn!(setting = %name, value = %value, "Ignoring invalid override"),
                },
                "warn_on_unmatched_globs" => match parse_bool(value) {
                    Some(b) => settings.warn_on_unmatched_globs = b,
                    None => warn!(setting = %name, value = %value, "Ignoring invalid override"),
                },
                "follow_links" => match parse_bool(value) {
                    Some(b) => settings.follow_links = b,
                    None => warn!(setting = %name, value = %value, "Ignoring invalid override"),
                },
                "deprecated_fields" => settings.deprecated_fields = split_list(value),
                "exclude" => settings.exclude = split_list(value),
                "script_extensions" => settings.script_extensions = split_list(value),
                _ => continue,
            }
            debug!(setting = %name, value = %value, "Applied environment override");
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
