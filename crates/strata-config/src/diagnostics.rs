//! Diagnostics produced while validating configuration files

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short code identifying what went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    FileNotFound,
    #[serde(rename = "YAMLSyntaxError")]
    YamlSyntaxError,
    FrontmatterSyntaxError,
    #[serde(rename = "JSONSyntaxError")]
    JsonSyntaxError,
    SchemaValidationError,
    MissingFileReference,
    MissingTemplateReference,
    CircularDependency,
    EmptyContextsList,
    DeprecatedField,
    MissingHookName,
    InvalidTrigger,
    InvalidHookType,
    MissingContext,
    MissingScript,
    UnknownConfigType,
    UnmatchedGlobPattern,
    LegacyJsonProfile,
    MergeConflict,
    UnexpectedError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::YamlSyntaxError => "YAMLSyntaxError",
            ErrorKind::FrontmatterSyntaxError => "FrontmatterSyntaxError",
            ErrorKind::JsonSyntaxError => "JSONSyntaxError",
            ErrorKind::SchemaValidationError => "SchemaValidationError",
            ErrorKind::MissingFileReference => "MissingFileReference",
            ErrorKind::MissingTemplateReference => "MissingTemplateReference",
            ErrorKind::CircularDependency => "CircularDependency",
            ErrorKind::EmptyContextsList => "EmptyContextsList",
            ErrorKind::DeprecatedField => "DeprecatedField",
            ErrorKind::MissingHookName => "MissingHookName",
            ErrorKind::InvalidTrigger => "InvalidTrigger",
            ErrorKind::InvalidHookType => "InvalidHookType",
            ErrorKind::MissingContext => "MissingContext",
            ErrorKind::MissingScript => "MissingScript",
            ErrorKind::UnknownConfigType => "UnknownConfigType",
            ErrorKind::UnmatchedGlobPattern => "UnmatchedGlobPattern",
            ErrorKind::LegacyJsonProfile => "LegacyJsonProfile",
            ErrorKind::MergeConflict => "MergeConflict",
            ErrorKind::UnexpectedError => "UnexpectedError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic tied to a file
///
/// Built with [`ConfigurationError::error`], [`ConfigurationError::warning`]
/// or [`ConfigurationError::info`] and refined with the `with_*` methods
/// before it is handed to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationError {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<usize>,
    #[serde(rename = "error_type")]
    pub kind: ErrorKind,
    pub message: String,
    /// Source lines around the fault
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub severity: Severity,
}

impl ConfigurationError {
    pub fn new(
        severity: Severity,
        kind: ErrorKind,
        file_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            line_number: None,
            column_number: None,
            kind,
            message: message.into(),
            context: None,
            severity,
        }
    }

    pub fn error(kind: ErrorKind, file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, file_path, message)
    }

    pub fn warning(
        kind: ErrorKind,
        file_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, kind, file_path, message)
    }

    pub fn info(kind: ErrorKind, file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, file_path, message)
    }

    /// Attach a 1-based line/column location
    pub fn with_location(mut self, line: Option<usize>, column: Option<usize>) -> Self {
        self.line_number = line;
        self.column_number = column;
        self
    }

    /// Attach surrounding source lines
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Whether this diagnostic is about `path`
    ///
    /// A circular dependency names its whole cycle in `file_path` and
    /// concerns every file on it.
    pub fn concerns(&self, path: &str) -> bool {
        if self.file_path == path {
            return true;
        }
        self.kind == ErrorKind::CircularDependency
            && self.file_path.split(CYCLE_SEPARATOR).any(|member| member == path)
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_path)?;
        if let Some(line) = self.line_number {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column_number {
                write!(f, ":{}", column)?;
            }
        }
        write!(f, ": {} [{}] {}", self.severity, self.kind, self.message)
    }
}

/// Number of lines shown on each side of a faulty line
pub const CONTEXT_RADIUS: usize = 2;

/// Joins the members of a reported cycle, `a.yaml -> b.yaml -> a.yaml`
pub const CYCLE_SEPARATOR: &str = " -> ";

/// Render the lines around 1-based `line`, marking the faulty one.
///
/// A line past the end (parsers report end-of-input there) is clamped to the
/// last line. Returns `None` for line 0 or empty source.
pub fn source_context(source: &str, line: usize) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    if line == 0 || lines.is_empty() {
        return None;
    }
    let line = line.min(lines.len());

    let first = line.saturating_sub(CONTEXT_RADIUS).max(1);
    let last = (line + CONTEXT_RADIUS).min(lines.len());
    let rendered = (first..=last)
        .map(|n| {
            let marker = if n == line { ">" } else { " " };
            format!("{} {:>4} | {}", marker, n, lines[n - 1])
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(rendered)
}
