//! Validation of configuration files and directories

pub mod graph;
pub mod kind;
pub mod references;
pub mod rules;
pub mod validator;

pub use graph::{cycle_diagnostics, find_cycles, CycleDetector, ReferenceGraph};
pub use kind::{determine_kind, ConfigKind, SourceFormat};
pub use references::{check_references, resolve_reference, Reference, ReferenceCheck, Resolution};
pub use rules::check_business_rules;
pub use validator::ConfigValidator;
