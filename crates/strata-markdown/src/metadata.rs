//! Derived document statistics and frontmatter promotion

use crate::error::MarkdownResult;
use crate::parser::FrontmatterParser;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Frontmatter keys copied to the top level of extracted metadata
pub const PROMOTED_KEYS: [&str; 7] = [
    "title",
    "description",
    "tags",
    "categories",
    "priority",
    "author",
    "date",
];

/// Number of header titles kept in the `headers` list
pub const MAX_LISTED_HEADERS: usize = 5;

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#+\s+(.+?)\s*$").expect("valid header regex"));
static CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid code block regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));

/// Structural statistics for a markdown body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub content_length: usize,
    pub word_count: usize,
    pub line_count: usize,
    pub headers: Vec<String>,
    pub code_block_count: usize,
    pub link_count: usize,
}

impl DocumentStats {
    /// Compute statistics for a markdown body
    pub fn compute(body: &str) -> Self {
        Self {
            content_length: body.chars().count(),
            word_count: body.split_whitespace().count(),
            line_count: body.lines().count(),
            headers: HEADER_RE
                .captures_iter(body)
                .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                .collect(),
            code_block_count: CODE_BLOCK_RE.find_iter(body).count(),
            link_count: LINK_RE.find_iter(body).count(),
        }
    }

    /// Number of markdown headers found
    pub fn header_count(&self) -> usize {
        self.headers.len()
    }
}

/// Parse a document and compute its metadata mapping.
///
/// The result holds the derived statistics, the full frontmatter under
/// `frontmatter`, and each of [`PROMOTED_KEYS`] present in the frontmatter
/// copied to the top level.
pub fn extract_metadata(content: &str) -> MarkdownResult<Map<String, Value>> {
    let doc = FrontmatterParser::new().parse(content)?;
    let has_frontmatter = doc.has_frontmatter();
    let (frontmatter, body) = doc.into_parts();
    Ok(build_metadata(frontmatter, &body, has_frontmatter))
}

pub(crate) fn build_metadata(
    frontmatter: Map<String, Value>,
    body: &str,
    has_frontmatter: bool,
) -> Map<String, Value> {
    let stats = DocumentStats::compute(body);
    let mut metadata = Map::new();

    metadata.insert("content_length".into(), stats.content_length.into());
    metadata.insert("word_count".into(), stats.word_count.into());
    metadata.insert("line_count".into(), stats.line_count.into());
    metadata.insert("has_frontmatter".into(), has_frontmatter.into());
    metadata.insert("header_count".into(), stats.header_count().into());
    metadata.insert(
        "headers".into(),
        Value::Array(
            stats
                .headers
                .iter()
                .take(MAX_LISTED_HEADERS)
                .cloned()
                .map(Value::String)
                .collect(),
        ),
    );
    metadata.insert("code_block_count".into(), stats.code_block_count.into());
    metadata.insert("link_count".into(), stats.link_count.into());

    for key in PROMOTED_KEYS {
        if let Some(value) = frontmatter.get(key) {
            metadata.insert(key.to_string(), value.clone());
        }
    }
    metadata.insert("frontmatter".into(), Value::Object(frontmatter));

    metadata
}
