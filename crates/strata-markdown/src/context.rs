//! Loaded markdown context files

use crate::error::MarkdownResult;
use crate::metadata::build_metadata;
use crate::parser::FrontmatterParser;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::SystemTime;

/// A markdown context file with its derived metadata
///
/// Content and metadata always come from the same read of the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextFile {
    /// Path identity, relative to the loader's base directory when possible
    pub file_path: String,
    /// Markdown body with frontmatter stripped
    pub content: String,
    /// Derived statistics plus promoted frontmatter fields
    pub metadata: Map<String, Value>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub priority: i64,
    /// ISO-8601 modification time captured at load
    pub last_modified: String,
}

impl ContextFile {
    /// Build a context file from raw document text
    pub fn from_source(
        file_path: impl Into<String>,
        source: &str,
        modified: SystemTime,
    ) -> MarkdownResult<Self> {
        let doc = FrontmatterParser::new().parse(source)?;
        let has_frontmatter = doc.has_frontmatter();
        let (frontmatter, body) = doc.into_parts();

        let tags = parse_string_set(frontmatter.get("tags"));
        let categories = parse_string_set(frontmatter.get("categories"));
        let priority = parse_priority(frontmatter.get("priority"));
        let metadata = build_metadata(frontmatter, &body, has_frontmatter);

        Ok(Self {
            file_path: file_path.into(),
            content: body,
            metadata,
            tags,
            categories,
            priority,
            last_modified: DateTime::<Utc>::from(modified).to_rfc3339(),
        })
    }

    /// Frontmatter mapping as it appeared in the file
    pub fn frontmatter(&self) -> Option<&Map<String, Value>> {
        self.metadata.get("frontmatter").and_then(Value::as_object)
    }

    /// Whether the file carried any frontmatter keys
    pub fn has_frontmatter(&self) -> bool {
        self.metadata
            .get("has_frontmatter")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.get("title").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata.get("description").and_then(Value::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// Parse a `tags`/`categories` value given either as a list or a
/// comma-separated string. Order is kept and duplicates dropped.
pub fn parse_string_set(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::String(s)) => s.split(',').map(|part| part.trim().to_string()).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    let mut set: Vec<String> = Vec::with_capacity(raw.len());
    for item in raw {
        if !item.is_empty() && !set.contains(&item) {
            set.push(item);
        }
    }
    set
}

/// Coerce a `priority` value to an integer; anything else is 0
pub fn parse_priority(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_source_with_frontmatter() {
        let source = "---\ntitle: Style\ntags: rust, style , rust\ncategories: [coding]\npriority: 7\n---\n# Style\nBody";
        let file = ContextFile::from_source("contexts/style.md", source, SystemTime::UNIX_EPOCH)
            .unwrap();

        assert_eq!(file.file_path, "contexts/style.md");
        assert_eq!(file.content, "# Style\nBody");
        assert_eq!(file.tags, vec!["rust", "style"]);
        assert_eq!(file.categories, vec!["coding"]);
        assert_eq!(file.priority, 7);
        assert_eq!(file.title(), Some("Style"));
        assert!(file.has_frontmatter());
        assert!(file.has_tag("style"));
        assert!(file.last_modified.starts_with("1970-01-01T00:00:00"));
    }

    #[test]
    fn test_from_source_without_frontmatter() {
        let file = ContextFile::from_source("a.md", "just text", SystemTime::UNIX_EPOCH).unwrap();

        assert!(file.tags.is_empty());
        assert_eq!(file.priority, 0);
        assert!(!file.has_frontmatter());
        assert_eq!(file.frontmatter(), Some(&Map::new()));
    }

    #[test]
    fn test_parse_priority_coercion() {
        assert_eq!(parse_priority(Some(&json!(3))), 3);
        assert_eq!(parse_priority(Some(&json!("12"))), 12);
        assert_eq!(parse_priority(Some(&json!("high"))), 0);
        assert_eq!(parse_priority(Some(&json!(2.5))), 0);
        assert_eq!(parse_priority(None), 0);
    }

    #[test]
    fn test_parse_string_set_forms() {
        assert_eq!(parse_string_set(Some(&json!(["a", "b", "a"]))), vec!["a", "b"]);
        assert_eq!(parse_string_set(Some(&json!("a, b,,c"))), vec!["a", "b", "c"]);
        assert!(parse_string_set(Some(&json!({"a": 1}))).is_empty());
    }
}
