//! Markdown parser for splitting YAML frontmatter from body content

use crate::error::{MarkdownError, MarkdownResult};
use serde_json::{Map, Value};

/// Delimiter that opens and closes a frontmatter block
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Frontmatter mapping as parsed from YAML
pub type Frontmatter = Map<String, Value>;

/// Markdown content with the frontmatter split off
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// Parsed frontmatter; empty when the document has none
    pub frontmatter: Frontmatter,
    /// Markdown body with the frontmatter block removed
    pub body: String,
}

impl ParsedDocument {
    /// Create a new parsed document
    pub fn new(frontmatter: Frontmatter, body: impl Into<String>) -> Self {
        Self {
            frontmatter,
            body: body.into(),
        }
    }

    /// Whether any frontmatter keys were found
    pub fn has_frontmatter(&self) -> bool {
        !self.frontmatter.is_empty()
    }

    /// Split into `(frontmatter, body)`
    pub fn into_parts(self) -> (Frontmatter, String) {
        (self.frontmatter, self.body)
    }
}

/// Parser for markdown files with YAML frontmatter
///
/// Expects frontmatter to be delimited by `---` lines at the very start of
/// the document:
///
/// ```text
/// ---
/// title: Example
/// ---
/// # Markdown content
/// ```
///
/// Documents without frontmatter are valid and come back unchanged.
#[derive(Debug, Clone, Default)]
pub struct FrontmatterParser;

impl FrontmatterParser {
    /// Create a new frontmatter parser
    pub fn new() -> Self {
        Self
    }

    /// Parse markdown content into frontmatter and body.
    ///
    /// Returns an empty mapping and the untouched content when the document
    /// does not open with a `---` line, or when the opening delimiter is never
    /// closed. Fails only when a delimited block holds invalid YAML or YAML
    /// that is not a mapping.
    pub fn parse(&self, content: &str) -> MarkdownResult<ParsedDocument> {
        if !content.starts_with(FRONTMATTER_DELIMITER) {
            return Ok(ParsedDocument::new(Map::new(), content));
        }

        let mut lines = content.split_inclusive('\n');
        let opening = match lines.next() {
            Some(line) if is_delimiter(line) => line,
            _ => return Ok(ParsedDocument::new(Map::new(), content)),
        };

        let yaml_start = opening.len();
        let mut offset = yaml_start;
        for line in lines {
            if is_delimiter(line) {
                let yaml = &content[yaml_start..offset];
                let body = &content[offset + line.len()..];
                let frontmatter = self.parse_yaml_block(yaml)?;
                return Ok(ParsedDocument::new(frontmatter, body));
            }
            offset += line.len();
        }

        // Opening delimiter without a closing one reads as a horizontal rule
        Ok(ParsedDocument::new(Map::new(), content))
    }

    /// Parse only the frontmatter, discarding the body
    pub fn parse_frontmatter(&self, content: &str) -> MarkdownResult<Frontmatter> {
        self.parse(content).map(|doc| doc.frontmatter)
    }

    /// Render a frontmatter mapping and body back into a markdown document.
    ///
    /// The output parses back to the same mapping and body.
    pub fn serialize(&self, frontmatter: &Frontmatter, body: &str) -> MarkdownResult<String> {
        let yaml = if frontmatter.is_empty() {
            String::new()
        } else {
            serde_yaml::to_string(frontmatter).map_err(|e| MarkdownError::Frontmatter {
                message: e.to_string(),
                line: None,
                column: None,
            })?
        };

        Ok(format!(
            "{delim}\n{yaml}{delim}\n{body}",
            delim = FRONTMATTER_DELIMITER
        ))
    }

    fn parse_yaml_block(&self, yaml: &str) -> MarkdownResult<Frontmatter> {
        if yaml.trim().is_empty() {
            return Ok(Map::new());
        }

        // The block starts on the second line of the document
        let value: Value =
            serde_yaml::from_str(yaml).map_err(|e| MarkdownError::from_yaml(&e, 1))?;

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(MarkdownError::not_a_mapping(value_kind(&other))),
        }
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == FRONTMATTER_DELIMITER
}

/// Short name of a JSON value's type, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
