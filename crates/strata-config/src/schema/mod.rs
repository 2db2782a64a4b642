//! Typed schema models for profiles, hooks and contexts
//!
//! Each model is built from a parsed mapping by a `from_*` constructor that
//! checks every field and collects all violations into one [`SchemaError`]
//! instead of stopping at the first bad field.

pub mod context;
pub mod hook;
pub mod profile;

pub use context::ContextConfig;
pub use hook::{
    ContextSourceConfig, HookConfig, HookReference, HookTrigger, HookType, ScriptConfig,
    DEFAULT_HOOK_TIMEOUT, MAX_HOOK_TIMEOUT, MIN_HOOK_TIMEOUT,
};
pub use profile::{Complexity, EnhancedProfileConfig, ProfileCategory};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use strata_markdown::value_kind;

/// Version assigned when a configuration does not declare one
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Date format for `created`/`updated`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One field that holds an unacceptable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Every schema violation found in one configuration object
///
/// Missing required fields and invalid values are kept apart so the message
/// can list all of the former together, then all of the latter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaError {
    pub schema: String,
    pub missing: Vec<String>,
    pub invalid: Vec<FieldViolation>,
}

impl SchemaError {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    /// Record a missing required field
    pub fn missing(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.missing.contains(&field) {
            self.missing.push(field);
        }
    }

    /// Record a field with an unacceptable value
    pub fn invalid(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.invalid.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.missing.len() + self.invalid.len()
    }

    /// Whether `field` is missing or invalid
    pub fn mentions(&self, field: &str) -> bool {
        self.missing.iter().any(|f| f == field) || self.invalid.iter().any(|v| v.field == field)
    }

    /// Remove and return the invalid-value violations for `field`
    pub fn take_invalid(&mut self, field: &str) -> Vec<FieldViolation> {
        let (taken, kept) = std::mem::take(&mut self.invalid)
            .into_iter()
            .partition(|v| v.field == field);
        self.invalid = kept;
        taken
    }

    /// Fold violations of a nested object under `prefix`
    pub fn absorb_nested(&mut self, prefix: &str, nested: SchemaError) {
        for field in nested.missing {
            self.missing(format!("{}.{}", prefix, field));
        }
        for violation in nested.invalid {
            self.invalid(format!("{}.{}", prefix, violation.field), violation.message);
        }
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`
    pub fn into_result<T>(self, value: T) -> Result<T, SchemaError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} schema validation failed", self.schema)?;
        if !self.missing.is_empty() {
            write!(f, "; missing required fields: {}", self.missing.join(", "))?;
        }
        if !self.invalid.is_empty() {
            let invalid = self
                .invalid
                .iter()
                .map(|v| format!("{} ({})", v.field, v.message))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "; invalid fields: {}", invalid)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// String-valued enumeration accepted by a schema field
pub trait SchemaEnum: Sized + Copy + 'static {
    const VARIANTS: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.as_str() == value)
    }

    fn expected() -> String {
        Self::VARIANTS
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Required non-empty string field
pub(crate) fn required_str(map: &Map<String, Value>, field: &str, errs: &mut SchemaError) -> String {
    match map.get(field) {
        None | Some(Value::Null) => {
            errs.missing(field);
            String::new()
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errs.missing(field);
            String::new()
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            errs.invalid(field, format!("expected a string, found {}", value_kind(other)));
            String::new()
        }
    }
}

/// Optional string field; numbers and booleans are rendered as text
pub(crate) fn optional_str(
    map: &Map<String, Value>,
    field: &str,
    errs: &mut SchemaError,
) -> Option<String> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            errs.invalid(field, format!("expected a string, found {}", value_kind(other)));
            None
        }
    }
}

/// Optional list of strings
pub(crate) fn string_list(
    map: &Map<String, Value>,
    field: &str,
    errs: &mut SchemaError,
) -> Vec<String> {
    match map.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) => out.push(s.clone()),
                    other => errs.invalid(
                        format!("{}[{}]", field, index),
                        format!("expected a string, found {}", value_kind(other)),
                    ),
                }
            }
            out
        }
        Some(other) => {
            errs.invalid(
                field,
                format!("expected a list of strings, found {}", value_kind(other)),
            );
            Vec::new()
        }
    }
}

/// Optional nested mapping
pub(crate) fn mapping(
    map: &Map<String, Value>,
    field: &str,
    errs: &mut SchemaError,
) -> Map<String, Value> {
    match map.get(field) {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(m)) => m.clone(),
        Some(other) => {
            errs.invalid(field, format!("expected a mapping, found {}", value_kind(other)));
            Map::new()
        }
    }
}

pub(crate) fn bool_field(
    map: &Map<String, Value>,
    field: &str,
    default: bool,
    errs: &mut SchemaError,
) -> bool {
    match map.get(field) {
        None | Some(Value::Null) => default,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            errs.invalid(field, format!("expected a boolean, found {}", value_kind(other)));
            default
        }
    }
}

/// Optional integer constrained to `[min, max]`
pub(crate) fn bounded_int(
    map: &Map<String, Value>,
    field: &str,
    min: u64,
    max: u64,
    errs: &mut SchemaError,
) -> Option<u64> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) if v >= min as i64 && v <= max as i64 => Some(v as u64),
            _ => {
                errs.invalid(
                    field,
                    format!("{} is out of range [{}, {}]", n, min, max),
                );
                None
            }
        },
        Some(other) => {
            errs.invalid(field, format!("expected an integer, found {}", value_kind(other)));
            None
        }
    }
}

/// Optional enumeration field
pub(crate) fn enum_field<T: SchemaEnum>(
    map: &Map<String, Value>,
    field: &str,
    errs: &mut SchemaError,
) -> Option<T> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let parsed = T::parse(s);
            if parsed.is_none() {
                errs.invalid(
                    field,
                    format!("'{}' is not one of: {}", s, T::expected()),
                );
            }
            parsed
        }
        Some(other) => {
            errs.invalid(
                field,
                format!("expected one of: {}, found {}", T::expected(), value_kind(other)),
            );
            None
        }
    }
}

/// Required enumeration field
pub(crate) fn required_enum<T: SchemaEnum>(
    map: &Map<String, Value>,
    field: &str,
    errs: &mut SchemaError,
) -> Option<T> {
    if matches!(map.get(field), None | Some(Value::Null)) {
        errs.missing(field);
        return None;
    }
    enum_field(map, field, errs)
}

/// Optional `YYYY-MM-DD` date field
pub(crate) fn date_field(
    map: &Map<String, Value>,
    field: &str,
    errs: &mut SchemaError,
) -> Option<NaiveDate> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => match NaiveDate::parse_from_str(s.trim(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                errs.invalid(field, format!("'{}' is not a YYYY-MM-DD date", s));
                None
            }
        },
        Some(other) => {
            errs.invalid(
                field,
                format!("expected a YYYY-MM-DD date, found {}", value_kind(other)),
            );
            None
        }
    }
}
