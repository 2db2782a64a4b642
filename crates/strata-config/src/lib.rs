//! Validation and merging for strata profiles, hooks and contexts
//!
//! A strata library is a directory of YAML profiles (`profiles/`), YAML hook
//! definitions (`hooks/`) and markdown context files. This crate:
//!
//! - checks each file against its schema ([`EnhancedProfileConfig`],
//!   [`HookConfig`], [`ContextConfig`]) and collects every violation,
//! - resolves file references and reports missing targets,
//! - detects circular references across a whole library,
//! - merges legacy JSON profiles into the YAML shape, recording conflicts.
//!
//! Problems inside files never surface as `Err`: they are returned as
//! [`ConfigurationError`] diagnostics in a [`ValidationReport`].
//!
//! ```ignore
//! use strata_config::ConfigValidator;
//!
//! let report = ConfigValidator::new("library").validate_all("library");
//! if !report.is_valid {
//!     for error in &report.errors {
//!         eprintln!("{}", error);
//!     }
//! }
//! ```

pub mod diagnostics;
pub mod error;
pub mod merge;
pub mod report;
pub mod schema;
pub mod settings;
pub mod validation;

pub use diagnostics::{source_context, ConfigurationError, ErrorKind, Severity};
pub use error::{ConfigError, ConfigResult};
pub use merge::{
    convert_json_to_yaml_config, create_migration_report, validate_merged_config, ConfigMerger,
    MergeConflict, MergeSide, MigrationReport,
};
pub use report::{ReportBuilder, ReportSummary, ValidationReport};
pub use schema::{
    Complexity, ContextConfig, ContextSourceConfig, EnhancedProfileConfig, FieldViolation, HookConfig,
    HookReference, HookTrigger, HookType, ProfileCategory, SchemaEnum, SchemaError, ScriptConfig,
};
pub use settings::{EnvOverrides, ValidatorSettings};
pub use validation::{ConfigKind, ConfigValidator, CycleDetector, ReferenceGraph};
