//! Deciding what kind of configuration a file holds

use serde_json::{Map, Value};
use std::fmt;
use std::path::{Component, Path};

/// Directory whose files are profiles
pub const PROFILES_DIR: &str = "profiles";
/// Directory whose files are hooks
pub const HOOKS_DIR: &str = "hooks";

/// Kind of configuration held by a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Profile,
    Hook,
    Context,
    /// A JSON profile in the pre-YAML format
    LegacyProfile,
    Unknown,
}

impl ConfigKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Profile => "profile",
            ConfigKind::Hook => "hook",
            ConfigKind::Context => "context",
            ConfigKind::LegacyProfile => "legacy profile",
            ConfigKind::Unknown => "unknown",
        }
    }

    pub fn is_profile(&self) -> bool {
        matches!(self, ConfigKind::Profile | ConfigKind::LegacyProfile)
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a file's text is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Markdown,
    Json,
}

/// Pick the parser from the extension; anything unrecognised is YAML
pub fn source_format(path: &Path) -> SourceFormat {
    match extension(path).as_deref() {
        Some("md") | Some("markdown") => SourceFormat::Markdown,
        Some("json") => SourceFormat::Json,
        _ => SourceFormat::Yaml,
    }
}

/// Extensions picked up by directory discovery
pub fn is_config_file(path: &Path) -> bool {
    matches!(
        extension(path).as_deref(),
        Some("yaml") | Some("yml") | Some("md") | Some("markdown") | Some("json")
    )
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Kind implied by location alone: markdown is always a context, files
/// below `profiles/` or `hooks/` are profiles or hooks
pub fn kind_from_path(relative: &Path) -> Option<ConfigKind> {
    let format = source_format(relative);
    if format == SourceFormat::Markdown {
        return Some(ConfigKind::Context);
    }

    let parent = relative.parent()?;
    let in_dir = |name: &str| {
        parent
            .components()
            .any(|c| matches!(c, Component::Normal(part) if part == name))
    };

    if in_dir(PROFILES_DIR) {
        Some(if format == SourceFormat::Json {
            ConfigKind::LegacyProfile
        } else {
            ConfigKind::Profile
        })
    } else if in_dir(HOOKS_DIR) {
        Some(ConfigKind::Hook)
    } else {
        None
    }
}

/// Kind implied by the keys a parsed document carries
pub fn kind_from_shape(map: &Map<String, Value>, format: SourceFormat) -> ConfigKind {
    if format == SourceFormat::Json && map.contains_key("paths") {
        ConfigKind::LegacyProfile
    } else if map.contains_key("trigger") || map.contains_key("type") {
        ConfigKind::Hook
    } else if map.contains_key("contexts") || map.contains_key("mcp_servers") {
        ConfigKind::Profile
    } else {
        ConfigKind::Unknown
    }
}

/// Location first, then shape
pub fn determine_kind(relative: &Path, map: &Map<String, Value>) -> ConfigKind {
    kind_from_path(relative).unwrap_or_else(|| kind_from_shape(map, source_format(relative)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_kind_from_directory() {
        assert_eq!(kind_from_path(Path::new("profiles/dev.yaml")), Some(ConfigKind::Profile));
        assert_eq!(kind_from_path(Path::new("team/profiles/old.json")), Some(ConfigKind::LegacyProfile));
        assert_eq!(kind_from_path(Path::new("hooks/lint.yml")), Some(ConfigKind::Hook));
        assert_eq!(kind_from_path(Path::new("notes/anything.md")), Some(ConfigKind::Context));
        assert_eq!(kind_from_path(Path::new("hooks.yaml")), None);
        assert_eq!(kind_from_path(Path::new("misc/a.yaml")), None);
    }

    #[test]
    fn test_kind_from_shape() {
        let yaml = SourceFormat::Yaml;
        assert_eq!(kind_from_shape(&map(json!({"trigger": "manual"})), yaml), ConfigKind::Hook);
        assert_eq!(kind_from_shape(&map(json!({"type": "script"})), yaml), ConfigKind::Hook);
        assert_eq!(kind_from_shape(&map(json!({"contexts": []})), yaml), ConfigKind::Profile);
        assert_eq!(kind_from_shape(&map(json!({"mcp_servers": []})), yaml), ConfigKind::Profile);
        assert_eq!(kind_from_shape(&map(json!({"paths": []})), SourceFormat::Json), ConfigKind::LegacyProfile);
        assert_eq!(kind_from_shape(&map(json!({"title": "x"})), yaml), ConfigKind::Unknown);
    }

    #[test]
    fn test_source_format() {
        assert_eq!(source_format(Path::new("a.MD")), SourceFormat::Markdown);
        assert_eq!(source_format(Path::new("a.json")), SourceFormat::Json);
        assert_eq!(source_format(Path::new("hooks/a.hook")), SourceFormat::Yaml);
        assert!(is_config_file(Path::new("x.yml")));
        assert!(!is_config_file(Path::new("x.txt")));
    }
}
