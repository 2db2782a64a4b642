//! File and directory validation

use crate::diagnostics::{source_context, ConfigurationError, ErrorKind};
use crate::merge::convert_json_to_yaml_config;
use crate::report::{ReportBuilder, ValidationReport};
use crate::schema::{ContextConfig, EnhancedProfileConfig, HookConfig, SchemaError};
use crate::settings::ValidatorSettings;
use crate::validation::graph::{cycle_diagnostics, find_cycles, ReferenceGraph};
use crate::validation::kind::{determine_kind, is_config_file, source_format, ConfigKind, SourceFormat};
use crate::validation::references::check_references;
use crate::validation::rules::check_business_rules;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use strata_markdown::{path_identity, value_kind, ContextLoader, MarkdownError};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// What one file contributes to the cross-file checks of a directory pass
#[derive(Debug, Default)]
struct FileOutcome {
    kind: Option<ConfigKind>,
    /// Hook names a profile binds
    hook_refs: Vec<String>,
    /// Names a hook file answers to
    hook_names: Vec<String>,
}

/// Validates profiles, hooks and contexts
///
/// ```ignore
/// let validator = ConfigValidator::new("library");
/// let report = validator.validate_all("library");
/// for error in &report.errors {
///     eprintln!("{}", error);
/// }
/// ```
pub struct ConfigValidator {
    base_dir: PathBuf,
    settings: ValidatorSettings,
    loader: ContextLoader,
}

impl ConfigValidator {
    /// Validator with default settings plus `STRATA_*` overrides
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_settings(base_dir, ValidatorSettings::from_env())
    }

    pub fn with_settings(base_dir: impl Into<PathBuf>, settings: ValidatorSettings) -> Self {
        let base_dir = base_dir.into();
        Self {
            loader: ContextLoader::new(base_dir.clone()),
            base_dir,
            settings,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// Context loader shared by every pass of this validator
    pub fn loader(&self) -> &ContextLoader {
        &self.loader
    }

    /// Validate one file end to end
    ///
    /// A relative path that does not exist as given is looked up under the
    /// base directory.
    pub fn validate_file(&self, path: impl AsRef<Path>) -> ValidationReport {
        let path = path.as_ref();
        let resolved = if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };

        let mut builder = ReportBuilder::new();
        let mut graph = ReferenceGraph::new();
        self.check_file(&self.base_dir, &resolved, &mut builder, &mut graph);
        builder.finish()
    }

    /// Validate every configuration file below `base_dir`
    ///
    /// Failures are recorded against the file they occur in; the pass always
    /// covers every discovered file, then checks hook bindings and cycles.
    pub fn validate_all(&self, base_dir: impl AsRef<Path>) -> ValidationReport {
        let base_dir = base_dir.as_ref();
        let mut builder = ReportBuilder::new();

        if !base_dir.is_dir() {
            builder.push(ConfigurationError::error(
                ErrorKind::FileNotFound,
                base_dir.to_string_lossy(),
                format!("Configuration directory '{}' does not exist", base_dir.display()),
            ));
            return builder.finish();
        }

        let files = self.discover(base_dir, &mut builder);
        info!(base_dir = %base_dir.display(), files = files.len(), "Discovered configuration files");

        let mut graph = ReferenceGraph::new();
        let mut outcomes: BTreeMap<String, FileOutcome> = BTreeMap::new();
        for file in &files {
            let outcome = self.check_file(base_dir, file, &mut builder, &mut graph);
            outcomes.insert(path_identity(base_dir, file), outcome);
        }

        link_hook_bindings(&outcomes, &mut builder, &mut graph);

        let cycles = find_cycles(&graph);
        if !cycles.is_empty() {
            warn!(cycles = cycles.len(), "Circular references found");
        }
        builder.extend(cycle_diagnostics(&cycles));

        let report = builder.finish();
        info!(
            files = report.summary.total_files,
            errors = report.summary.total_errors,
            warnings = report.summary.total_warnings,
            "Validation finished"
        );
        report
    }

    fn discover(&self, base_dir: &Path, builder: &mut ReportBuilder) -> Vec<PathBuf> {
        let excluded = self.exclude_set();
        let mut files = Vec::new();

        let walker = WalkDir::new(base_dir)
            .follow_links(self.settings.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| path_identity(base_dir, p))
                        .unwrap_or_else(|| base_dir.to_string_lossy().into_owned());
                    warn!(path = %path, error = %e, "Failed to walk directory entry");
                    builder.push(ConfigurationError::error(
                        ErrorKind::UnexpectedError,
                        path,
                        format!("Could not read directory entry: {}", e),
                    ));
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_config_file(entry.path()) {
                continue;
            }
            let relative = entry.path().strip_prefix(base_dir).unwrap_or(entry.path());
            if excluded.is_match(entry.file_name()) || excluded.is_match(relative) {
                debug!(path = %relative.display(), "Excluded from validation");
                continue;
            }
            files.push(entry.into_path());
        }

        files
    }

    fn exclude_set(&self) -> GlobSet {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.settings.exclude {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!(pattern = %pattern, error = %e, "Ignoring invalid exclude pattern"),
            }
        }
        builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build exclude set");
            GlobSet::empty()
        })
    }

    /// Existence, parse, schema, references, business rules, graph nodes
    fn check_file(
        &self,
        base_dir: &Path,
        path: &Path,
        builder: &mut ReportBuilder,
        graph: &mut ReferenceGraph,
    ) -> FileOutcome {
        let file_id = path_identity(base_dir, path);
        let relative = PathBuf::from(&file_id);
        builder.mark_checked(file_id.clone());

        if !path.is_file() {
            builder.push(ConfigurationError::error(
                ErrorKind::FileNotFound,
                &file_id,
                format!("File '{}' does not exist", path.display()),
            ));
            return FileOutcome::default();
        }

        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                warn!(path = %file_id, error = %e, "Failed to read configuration file");
                builder.push(ConfigurationError::error(
                    ErrorKind::UnexpectedError,
                    &file_id,
                    format!("Could not read file: {}", e),
                ));
                return FileOutcome::default();
            }
        };

        graph.add_node(file_id.clone());
        debug!(path = %file_id, "Validating configuration file");

        match source_format(&relative) {
            SourceFormat::Markdown => {
                self.check_context(&file_id, path, &source, builder);
                FileOutcome {
                    kind: Some(ConfigKind::Context),
                    ..FileOutcome::default()
                }
            }
            SourceFormat::Yaml => match parse_yaml(&file_id, &source) {
                Ok(map) => self.check_mapping(base_dir, &file_id, &relative, map, builder, graph),
                Err(diag) => {
                    builder.push(diag);
                    FileOutcome::default()
                }
            },
            SourceFormat::Json => match parse_json(&file_id, &source) {
                Ok(map) => self.check_mapping(base_dir, &file_id, &relative, map, builder, graph),
                Err(diag) => {
                    builder.push(diag);
                    FileOutcome::default()
                }
            },
        }
    }

    fn check_context(&self, file_id: &str, path: &Path, source: &str, builder: &mut ReportBuilder) {
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let file = match self.loader.load_context_file(&absolute) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %file_id, error = %e, "Failed to load context file");
                builder.push(markdown_diagnostic(file_id, source, e));
                return;
            }
        };

        if let Err(errs) = ContextConfig::from_context_file(&file, self.settings.min_context_length) {
            builder.push(schema_diagnostic(file_id, errs));
        }
        if let Some(frontmatter) = file.frontmatter() {
            builder.extend(check_business_rules(
                file_id,
                ConfigKind::Context,
                frontmatter,
                &self.settings,
            ));
        }
    }

    fn check_mapping(
        &self,
        base_dir: &Path,
        file_id: &str,
        relative: &Path,
        document: Value,
        builder: &mut ReportBuilder,
        graph: &mut ReferenceGraph,
    ) -> FileOutcome {
        let map = match document {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                builder.push(ConfigurationError::error(
                    ErrorKind::SchemaValidationError,
                    file_id,
                    format!("Expected a mapping at the document root, found {}", value_kind(&other)),
                ));
                return FileOutcome::default();
            }
        };

        let kind = determine_kind(relative, &map);
        let mut outcome = FileOutcome {
            kind: Some(kind),
            ..FileOutcome::default()
        };

        let checked = match kind {
            ConfigKind::Unknown => {
                builder.push(ConfigurationError::warning(
                    ErrorKind::UnknownConfigType,
                    file_id,
                    "Could not determine whether this file is a profile, hook or context",
                ));
                map
            }
            ConfigKind::LegacyProfile => {
                builder.push(ConfigurationError::info(
                    ErrorKind::LegacyJsonProfile,
                    file_id,
                    "Legacy JSON profile; migrate it to a YAML profile",
                ));
                builder.extend(check_business_rules(
                    file_id,
                    ConfigKind::Unknown,
                    &map,
                    &self.settings,
                ));
                let converted = convert_json_to_yaml_config(&map, &file_stem(relative));
                self.check_profile(file_id, &converted, builder);
                builder.extend(check_business_rules(
                    file_id,
                    ConfigKind::Profile,
                    &converted,
                    &self.settings,
                ));
                outcome.hook_refs = profile_hook_names(&converted);
                converted
            }
            ConfigKind::Profile => {
                self.check_profile(file_id, &map, builder);
                builder.extend(check_business_rules(file_id, kind, &map, &self.settings));
                outcome.hook_refs = profile_hook_names(&map);
                map
            }
            ConfigKind::Hook => {
                if let Err(errs) = HookConfig::from_mapping(&map) {
                    push_hook_schema_errors(file_id, errs, builder);
                }
                builder.extend(check_business_rules(file_id, kind, &map, &self.settings));
                outcome.hook_names = hook_names(&map, relative);
                map
            }
            ConfigKind::Context => map,
        };

        let refs = check_references(file_id, &checked, base_dir, &self.settings);
        builder.extend(refs.diagnostics);
        for target in refs.edges {
            graph.add_edge(file_id, target);
        }

        outcome
    }

    fn check_profile(&self, file_id: &str, map: &Map<String, Value>, builder: &mut ReportBuilder) {
        if let Err(errs) = EnhancedProfileConfig::from_mapping(map) {
            builder.push(schema_diagnostic(file_id, errs));
        }
    }
}

/// Match profile hook bindings against discovered hook files
fn link_hook_bindings(
    outcomes: &BTreeMap<String, FileOutcome>,
    builder: &mut ReportBuilder,
    graph: &mut ReferenceGraph,
) {
    let mut index: BTreeMap<&str, &str> = BTreeMap::new();
    for (file_id, outcome) in outcomes {
        for name in &outcome.hook_names {
            index.entry(name.as_str()).or_insert(file_id.as_str());
        }
    }

    for (file_id, outcome) in outcomes {
        if !outcome.kind.is_some_and(|k| k.is_profile()) {
            continue;
        }
        for name in &outcome.hook_refs {
            match index.get(name.as_str()) {
                Some(hook_id) => graph.add_edge(file_id.as_str(), *hook_id),
                None => builder.push(ConfigurationError::warning(
                    ErrorKind::MissingTemplateReference,
                    file_id,
                    format!("Hook '{}' does not match any hook file", name),
                )),
            }
        }
    }
}

fn parse_yaml(file_id: &str, source: &str) -> Result<Value, ConfigurationError> {
    serde_yaml::from_str::<Value>(source).map_err(|e| {
        let (line, column) = e
            .location()
            .map(|loc| (Some(loc.line()), Some(loc.column())))
            .unwrap_or((None, None));
        warn!(path = %file_id, error = %e, "YAML syntax error");
        located(
            ConfigurationError::error(ErrorKind::YamlSyntaxError, file_id, e.to_string()),
            source,
            line,
            column,
        )
    })
}

fn parse_json(file_id: &str, source: &str) -> Result<Value, ConfigurationError> {
    serde_json::from_str::<Value>(source).map_err(|e| {
        warn!(path = %file_id, error = %e, "JSON syntax error");
        let line = (e.line() > 0).then_some(e.line());
        let column = (e.column() > 0).then_some(e.column());
        located(
            ConfigurationError::error(ErrorKind::JsonSyntaxError, file_id, e.to_string()),
            source,
            line,
            column,
        )
    })
}

fn markdown_diagnostic(file_id: &str, source: &str, err: MarkdownError) -> ConfigurationError {
    let (line, column) = err.location();
    let kind = match err {
        MarkdownError::Frontmatter { .. } | MarkdownError::NotAMapping { .. } => {
            ErrorKind::FrontmatterSyntaxError
        }
        MarkdownError::NotFound { .. } => ErrorKind::FileNotFound,
        MarkdownError::Io { .. } => ErrorKind::UnexpectedError,
    };
    located(
        ConfigurationError::error(kind, file_id, err.to_string()),
        source,
        line,
        column,
    )
}

fn located(
    diag: ConfigurationError,
    source: &str,
    line: Option<usize>,
    column: Option<usize>,
) -> ConfigurationError {
    let diag = diag.with_location(line, column);
    match line.and_then(|l| source_context(source, l)) {
        Some(context) => diag.with_context(context),
        None => diag,
    }
}

fn schema_diagnostic(file_id: &str, errs: SchemaError) -> ConfigurationError {
    ConfigurationError::error(ErrorKind::SchemaValidationError, file_id, errs.to_string())
}

/// Trigger and type violations get their own kinds; the rest share one
/// schema error
fn push_hook_schema_errors(file_id: &str, mut errs: SchemaError, builder: &mut ReportBuilder) {
    for violation in errs.take_invalid("trigger") {
        builder.push(ConfigurationError::error(
            ErrorKind::InvalidTrigger,
            file_id,
            format!("Invalid trigger: {}", violation.message),
        ));
    }
    for violation in errs.take_invalid("type") {
        builder.push(ConfigurationError::error(
            ErrorKind::InvalidHookType,
            file_id,
            format!("Invalid hook type: {}", violation.message),
        ));
    }
    if !errs.is_empty() {
        builder.push(schema_diagnostic(file_id, errs));
    }
}

fn profile_hook_names(map: &Map<String, Value>) -> Vec<String> {
    let Some(Value::Object(hooks)) = map.get("hooks") else {
        return Vec::new();
    };
    crate::schema::profile::parse_hook_bindings(hooks)
        .into_values()
        .flatten()
        .map(|hook| hook.name)
        .collect()
}

/// A hook answers to its `name` field and its file stem
fn hook_names(map: &Map<String, Value>, relative: &Path) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(name) = map.get("name").and_then(Value::as_str) {
        names.push(name.to_string());
    }
    let stem = file_stem(relative);
    if !names.contains(&stem) {
        names.push(stem);
    }
    names
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn validator(dir: &Path) -> ConfigValidator {
        ConfigValidator::with_settings(dir, ValidatorSettings::default())
    }

    const BODY: &str = "Always run the formatter before committing and keep commits small.";

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let report = validator(dir.path()).validate_file(dir.path().join("profiles/none.yaml"));

        assert!(!report.is_valid);
        assert_eq!(report.errors[0].kind, ErrorKind::FileNotFound);
        assert!(report.files_checked.contains("profiles/none.yaml"));
    }

    #[test]
    fn test_yaml_syntax_error_has_location_and_context() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "profiles/bad.yaml", "name: bad\ncontexts: [a.md\nhooks: {}\n");

        let report = validator(dir.path()).validate_file(&path);
        assert_eq!(report.error_count(), 1);
        let error = &report.errors[0];
        assert_eq!(error.kind, ErrorKind::YamlSyntaxError);
        assert!(error.line_number.is_some());
        assert!(error.context.as_deref().unwrap_or("").contains('>'));
    }

    #[test]
    fn test_valid_profile() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "contexts/style.md", BODY);
        let path = write(
            dir.path(),
            "profiles/dev.yaml",
            "name: dev\ncategory: basic\ncontexts:\n  - contexts/style.md\n",
        );

        let report = validator(dir.path()).validate_file(&path);
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_hook_type_and_trigger_errors() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "hooks/bad.yaml",
            "name: bad\ntype: teleport\ntrigger: sometimes\ntimeout: 0\n",
        );

        let report = validator(dir.path()).validate_file(&path);
        let kinds: Vec<ErrorKind> = report.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::InvalidTrigger,
                ErrorKind::InvalidHookType,
                ErrorKind::SchemaValidationError,
            ]
        );
        assert!(report.errors[2].message.contains("timeout"));
    }

    #[test]
    fn test_unknown_shape_is_warning() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "misc/notes.yaml", "title: hello\n");

        let report = validator(dir.path()).validate_file(&path);
        assert!(report.is_valid);
        assert!(report.has_kind(ErrorKind::UnknownConfigType));
    }

    #[test]
    fn test_non_mapping_root() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "profiles/list.yaml", "- a\n- b\n");

        let report = validator(dir.path()).validate_file(&path);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::SchemaValidationError);
    }

    #[test]
    fn test_malformed_frontmatter() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "contexts/bad.md",
            &format!("---\ntitle: [unclosed\n---\n{}", BODY),
        );

        let report = validator(dir.path()).validate_file(&path);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::FrontmatterSyntaxError);
    }

    #[test]
    fn test_legacy_json_profile() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "contexts/a.md", BODY);
        let path = write(
            dir.path(),
            "profiles/old.json",
            r#"{"paths": ["contexts/a.md"], "hooks": {"on_session_start": ["x"]}}"#,
        );

        let report = validator(dir.path()).validate_file(&path);
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.has_kind(ErrorKind::LegacyJsonProfile));
    }

    #[test]
    fn test_json_syntax_error() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "profiles/broken.json", "{\n  \"paths\": [\n}\n");

        let report = validator(dir.path()).validate_file(&path);
        assert_eq!(report.errors[0].kind, ErrorKind::JsonSyntaxError);
        assert!(report.errors[0].line_number.is_some());
    }

    #[test]
    fn test_validate_all_links_hooks_and_excludes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "short");
        write(dir.path(), ".git/config.yaml", "- not: checked");
        write(dir.path(), "contexts/style.md", BODY);
        write(
            dir.path(),
            "hooks/inject.yaml",
            "name: inject-style\ntype: context\ntrigger: on_session_start\ncontext:\n  sources: [contexts/style.md]\n",
        );
        write(
            dir.path(),
            "profiles/dev.yaml",
            "name: dev\ncontexts: [contexts/style.md]\nhooks:\n  on_session_start: [inject-style, ghost]\n",
        );

        let report = validator(dir.path()).validate_all(dir.path());
        assert!(report.is_valid, "{:?}", report.errors);
        assert_eq!(report.summary.total_files, 3);
        let missing = report.of_kind(ErrorKind::MissingTemplateReference);
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains("ghost"));
    }

    #[test]
    fn test_validate_all_missing_directory() {
        let dir = TempDir::new().unwrap();
        let report = validator(dir.path()).validate_all(dir.path().join("nope"));
        assert_eq!(report.errors[0].kind, ErrorKind::FileNotFound);
    }
}
