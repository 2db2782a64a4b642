//! Context schema

use super::{optional_str, SchemaError, DEFAULT_VERSION};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use strata_markdown::{parse_string_set, value_kind, ContextFile};

/// A context file checked against the context schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextConfig {
    pub name: String,
    pub description: String,
    pub version: String,
    pub content: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub priority: i64,
}

impl ContextConfig {
    /// Check a loaded context file
    ///
    /// The name comes from frontmatter `name`, then `title`, then the file
    /// stem. The trimmed body must hold at least `min_length` characters.
    pub fn from_context_file(file: &ContextFile, min_length: usize) -> Result<Self, SchemaError> {
        let empty = Map::new();
        let frontmatter = file.frontmatter().unwrap_or(&empty);
        let mut errs = SchemaError::new("context");

        let name = optional_str(frontmatter, "name", &mut errs)
            .or_else(|| file.title().map(str::to_string))
            .unwrap_or_else(|| file_stem(&file.file_path));
        let description = optional_str(frontmatter, "description", &mut errs).unwrap_or_default();
        let version = optional_str(frontmatter, "version", &mut errs)
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());

        check_string_set(frontmatter, "tags", &mut errs);
        check_string_set(frontmatter, "categories", &mut errs);
        check_content(&file.content, min_length, &mut errs);

        errs.into_result(Self {
            name,
            description,
            version,
            content: file.content.clone(),
            tags: parse_string_set(frontmatter.get("tags")),
            categories: parse_string_set(frontmatter.get("categories")),
            priority: file.priority,
        })
    }
}

fn check_content(content: &str, min_length: usize, errs: &mut SchemaError) {
    let length = content.trim().chars().count();
    if length == 0 {
        errs.invalid("content", "Context content must be substantial; the body is empty");
    } else if length < min_length {
        errs.invalid(
            "content",
            format!(
                "Context content must be substantial; found {} characters, need at least {}",
                length, min_length
            ),
        );
    }
}

/// `tags`/`categories` must be a list of strings or a comma-separated string
fn check_string_set(frontmatter: &Map<String, Value>, field: &str, errs: &mut SchemaError) {
    match frontmatter.get(field) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(Value::Array(items)) => {
            if let Some(bad) = items.iter().find(|item| !item.is_string()) {
                errs.invalid(
                    field,
                    format!("expected a list of strings, found an item of type {}", value_kind(bad)),
                );
            }
        }
        Some(other) => errs.invalid(
            field,
            format!("expected a list of strings, found {}", value_kind(other)),
        ),
    }
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
