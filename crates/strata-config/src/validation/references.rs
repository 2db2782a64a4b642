//! File references made by profiles and hooks

use crate::diagnostics::{ConfigurationError, ErrorKind};
use crate::settings::ValidatorSettings;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use strata_markdown::path_identity;
use tracing::debug;

const URL_SCHEMES: [&str; 3] = ["http://", "https://", "ftp://"];

/// A path-valued field found in a configuration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Where the value sits, e.g. `contexts[2]`
    pub field: String,
    pub target: String,
}

/// How a reference resolved against the base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A URL; not checked
    Remote,
    /// A glob pattern and how many files it matched
    Glob { matches: usize },
    Found(PathBuf),
    Missing(PathBuf),
}

pub fn is_url(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    URL_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

pub fn is_glob(target: &str) -> bool {
    target.contains(['*', '?', '['])
}

/// Collect references under `contexts`, `context.sources` and a path-like
/// `script.command`
pub fn collect_references(map: &Map<String, Value>, settings: &ValidatorSettings) -> Vec<Reference> {
    let mut refs = Vec::new();
    push_list(&mut refs, "contexts", map.get("contexts"));

    if let Some(context) = map.get("context").and_then(Value::as_object) {
        push_list(&mut refs, "context.sources", context.get("sources"));
    }

    if let Some(command) = map
        .get("script")
        .and_then(Value::as_object)
        .and_then(|script| script.get("command"))
        .and_then(Value::as_str)
    {
        if let Some(path) = script_path(command, settings) {
            refs.push(Reference {
                field: "script.command".to_string(),
                target: path.to_string(),
            });
        }
    }

    refs
}

fn push_list(refs: &mut Vec<Reference>, field: &str, value: Option<&Value>) {
    let Some(Value::Array(items)) = value else {
        return;
    };
    for (index, item) in items.iter().enumerate() {
        if let Some(target) = item.as_str() {
            if !target.trim().is_empty() {
                refs.push(Reference {
                    field: format!("{}[{}]", field, index),
                    target: target.trim().to_string(),
                });
            }
        }
    }
}

/// The token of a command line that names a script file, if any
///
/// `./scripts/lint.sh --fix` gives `./scripts/lint.sh`; `python tools/check.py`
/// gives `tools/check.py`; `cargo fmt` gives nothing.
pub fn script_path<'c>(command: &'c str, settings: &ValidatorSettings) -> Option<&'c str> {
    command.split_whitespace().find(|token| {
        if token.starts_with('-') || is_url(token) {
            return false;
        }
        token.contains('/')
            || Path::new(token)
                .extension()
                .is_some_and(|ext| settings.is_script_extension(&ext.to_string_lossy()))
    })
}

/// Resolve `target` relative to `base_dir`; absolute paths are used as is
pub fn resolve_reference(base_dir: &Path, target: &str) -> Resolution {
    if is_url(target) {
        return Resolution::Remote;
    }

    let path = if Path::new(target).is_absolute() {
        PathBuf::from(target)
    } else {
        base_dir.join(target)
    };

    if is_glob(target) {
        let pattern = if Path::new(target).is_absolute() {
            target.to_string()
        } else {
            let base = glob::Pattern::escape(&base_dir.to_string_lossy());
            Path::new(&base).join(target).to_string_lossy().into_owned()
        };
        let matches = glob::glob(&pattern)
            .map(|paths| paths.filter_map(Result::ok).count())
            .unwrap_or(0);
        return Resolution::Glob { matches };
    }

    if path.exists() {
        Resolution::Found(path)
    } else {
        Resolution::Missing(path)
    }
}

/// Identity of `path` when it lies inside `base_dir`
pub fn internal_identity(base_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base_dir).ok()?;
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }
    Some(path_identity(base_dir, path))
}

/// Outcome of checking all references of one file
#[derive(Debug, Default)]
pub struct ReferenceCheck {
    pub diagnostics: Vec<ConfigurationError>,
    /// Identities of referenced files inside the base directory
    pub edges: Vec<String>,
}

/// Check that every reference in `map` resolves
pub fn check_references(
    file_id: &str,
    map: &Map<String, Value>,
    base_dir: &Path,
    settings: &ValidatorSettings,
) -> ReferenceCheck {
    let mut check = ReferenceCheck::default();

    for reference in collect_references(map, settings) {
        match resolve_reference(base_dir, &reference.target) {
            Resolution::Remote => {
                debug!(file = %file_id, target = %reference.target, "Skipping remote reference");
            }
            Resolution::Glob { matches } => {
                if matches == 0 && settings.warn_on_unmatched_globs {
                    check.diagnostics.push(ConfigurationError::warning(
                        ErrorKind::UnmatchedGlobPattern,
                        file_id,
                        format!(
                            "Pattern '{}' in {} matches no files",
                            reference.target, reference.field
                        ),
                    ));
                }
            }
            Resolution::Found(path) => {
                if let Some(target_id) = internal_identity(base_dir, &path) {
                    check.edges.push(target_id);
                }
            }
            Resolution::Missing(path) => {
                check.diagnostics.push(ConfigurationError::error(
                    ErrorKind::MissingFileReference,
                    file_id,
                    format!(
                        "Referenced file '{}' in {} does not exist ({})",
                        reference.target,
                        reference.field,
                        path.display()
                    ),
                ));
            }
        }
    }

    check
}
