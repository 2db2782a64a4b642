//! Aggregated validation results

use crate::diagnostics::{ConfigurationError, ErrorKind, Severity};
use serde::Serialize;
use std::collections::BTreeSet;

/// Summary counts for a validation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_files: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub total_info: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
}

/// Result of validating one file, a directory, or a merged configuration
///
/// `is_valid` is true exactly when `errors` is empty; warnings and info never
/// affect it. Diagnostics are ordered by file path, keeping discovery order
/// within a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ConfigurationError>,
    pub warnings: Vec<ConfigurationError>,
    pub info: Vec<ConfigurationError>,
    pub files_checked: BTreeSet<String>,
    pub summary: ReportSummary,
}

impl ValidationReport {
    /// Every diagnostic, errors first
    pub fn diagnostics(&self) -> impl Iterator<Item = &ConfigurationError> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .chain(self.info.iter())
    }

    /// Diagnostics of a given kind, at any severity
    pub fn of_kind(&self, kind: ErrorKind) -> Vec<&ConfigurationError> {
        self.diagnostics().filter(|d| d.kind == kind).collect()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.diagnostics().any(|d| d.kind == kind)
    }

    /// Diagnostics about one file, including cycles it belongs to
    pub fn for_file<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ConfigurationError> {
        self.diagnostics().filter(move |d| d.concerns(path))
    }

    /// Highest severity recorded for a file, if any
    pub fn file_severity(&self, path: &str) -> Option<Severity> {
        self.for_file(path).map(|d| d.severity).max()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn info_count(&self) -> usize {
        self.info.len()
    }
}

/// Collects diagnostics during a pass and produces the final report
#[derive(Debug, Default)]
pub struct ReportBuilder {
    errors: Vec<ConfigurationError>,
    warnings: Vec<ConfigurationError>,
    info: Vec<ConfigurationError>,
    files_checked: BTreeSet<String>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic under its severity
    pub fn push(&mut self, diagnostic: ConfigurationError) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
            Severity::Info => self.info.push(diagnostic),
        }
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = ConfigurationError>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    /// Record that a file took part in the pass
    pub fn mark_checked(&mut self, file_path: impl Into<String>) {
        self.files_checked.insert(file_path.into());
    }

    /// Fold a finished report into this one
    pub fn absorb(&mut self, report: ValidationReport) {
        self.errors.extend(report.errors);
        self.warnings.extend(report.warnings);
        self.info.extend(report.info);
        self.files_checked.extend(report.files_checked);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Sort diagnostics by file path and compute the summary
    pub fn finish(mut self) -> ValidationReport {
        for list in [&mut self.errors, &mut self.warnings, &mut self.info] {
            list.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        }

        let invalid_files = self
            .files_checked
            .iter()
            .filter(|file| self.errors.iter().any(|e| e.concerns(file)))
            .count();

        let summary = ReportSummary {
            total_files: self.files_checked.len(),
            total_errors: self.errors.len(),
            total_warnings: self.warnings.len(),
            total_info: self.info.len(),
            valid_files: self.files_checked.len() - invalid_files,
            invalid_files,
        };

        ValidationReport {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
            info: self.info,
            files_checked: self.files_checked,
            summary,
        }
    }
}
