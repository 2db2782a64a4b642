//! Error types for frontmatter parsing and context file loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while parsing markdown or loading context files
#[derive(Debug, Error)]
pub enum MarkdownError {
    /// The frontmatter block is present but is not valid YAML.
    ///
    /// `line` and `column` are 1-based and relative to the whole document,
    /// not to the YAML block.
    #[error("Invalid YAML frontmatter: {message}")]
    Frontmatter {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// The frontmatter parsed, but to something other than a mapping
    #[error("Frontmatter must be a mapping, found {found}")]
    NotAMapping { found: String },

    /// Context file does not exist
    #[error("Context file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Reading the file failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl MarkdownError {
    /// Create a frontmatter syntax error from a YAML parser failure.
    ///
    /// `line_offset` is the number of document lines preceding the YAML block.
    pub fn from_yaml(err: &serde_yaml::Error, line_offset: usize) -> Self {
        let location = err.location();
        Self::Frontmatter {
            message: err.to_string(),
            line: location.as_ref().map(|l| l.line() + line_offset),
            column: location.as_ref().map(|l| l.column()),
        }
    }

    /// Create a not-a-mapping error describing the value that was found
    pub fn not_a_mapping(found: impl Into<String>) -> Self {
        Self::NotAMapping {
            found: found.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Location of a syntax error, when the parser reported one
    pub fn location(&self) -> (Option<usize>, Option<usize>) {
        match self {
            Self::Frontmatter { line, column, .. } => (*line, *column),
            _ => (None, None),
        }
    }
}

/// Result type for markdown operations
pub type MarkdownResult<T> = Result<T, MarkdownError>;
