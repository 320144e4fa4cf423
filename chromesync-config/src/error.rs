//! Typed error variants for the chromesync-config crate.
//!
//! Loading distinguishes three failure families:
//!
//! - [`ConfigError::Malformed`]: the document is not structured data at all.
//!   Always fatal.
//! - [`ConfigError::Invalid`]: one or more fields failed a type, range, enum,
//!   format or placeholder check. Each [`FieldError`] carries the dotted path
//!   of the offending field.
//! - I/O and serialization failures raised by the persistence layer.
//!
//! # Example
//!
//! ```rust
//! use chromesync_config::{ConfigError, ConfigLoader, DocumentFormat, FieldErrorKind};
//! use std::collections::HashMap;
//!
//! let env: HashMap<String, String> = HashMap::new();
//! let loader = ConfigLoader::with_environment(env);
//! let err = loader
//!     .load_str(r#"{"logs": {"level": "LOUD"}}"#, DocumentFormat::Json)
//!     .unwrap_err();
//!
//! assert!(err.field_errors().iter().any(|e| {
//!     e.path.as_str() == "logs.level"
//!         && matches!(e.kind, FieldErrorKind::UnknownVariant { .. })
//! }));
//! ```

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::DocumentFormat;

/// Errors produced while loading, validating or persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing a config file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input could not be parsed as a structured document.
    #[error("malformed {format} document: {message}")]
    Malformed {
        format: DocumentFormat,
        message: String,
    },

    /// One or more fields failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(ValidationErrors),

    /// The configuration could not be rendered in the requested format.
    #[error("failed to serialize config as {format}: {message}")]
    Serialize {
        format: DocumentFormat,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    /// Field-level errors carried by an [`ConfigError::Invalid`] value.
    ///
    /// Empty for every other variant.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ConfigError::Invalid(errors) => &errors.0,
            _ => &[],
        }
    }

    /// True when the stored document itself is at fault (as opposed to the
    /// filesystem), i.e. a rewrite from defaults can recover.
    pub fn is_document_error(&self) -> bool {
        matches!(self, ConfigError::Malformed { .. } | ConfigError::Invalid(_))
    }
}

/// Non-empty list of field errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl From<Vec<FieldError>> for ConfigError {
    fn from(errors: Vec<FieldError>) -> Self {
        ConfigError::Invalid(ValidationErrors(errors))
    }
}

/// Dotted location of a field inside the document, e.g.
/// `sync.schedule.interval_hours` or `browsers.chrome.path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        FieldPath(String::new())
    }

    /// Path of `key` nested under `self`.
    pub fn child(&self, key: &str) -> Self {
        if self.0.is_empty() {
            FieldPath(key.to_string())
        } else {
            FieldPath(format!("{}.{key}", self.0))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath(path.to_string())
    }
}

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: FieldPath,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(path: FieldPath, kind: FieldErrorKind) -> Self {
        Self { path, kind }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

impl std::error::Error for FieldError {}

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// A required field is absent (or was deleted with `null` by an override).
    Missing,
    /// The value has the wrong JSON type.
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    /// A numeric value lies outside its allowed range.
    OutOfRange { value: i128, min: u32, max: u32 },
    /// A string is not one of the enumerated values.
    UnknownVariant {
        value: String,
        allowed: &'static [&'static str],
    },
    /// A string does not match the required shape (locale tag, clock time).
    InvalidFormat {
        value: String,
        expected: &'static str,
    },
    /// A `%NAME%` token refers to a variable that is not set.
    UnresolvedPlaceholder { name: String },
    /// A `%NAME%` token refers to a variable outside the allowlist.
    DisallowedPlaceholder { name: String },
    /// The key is not part of the schema (strict mode only).
    UnknownField,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldErrorKind::Missing => f.write_str("required field is missing"),
            FieldErrorKind::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            FieldErrorKind::OutOfRange { value, min, max } => {
                write!(f, "value {value} is outside the allowed range {min}..={max}")
            }
            FieldErrorKind::UnknownVariant { value, allowed } => {
                write!(f, "unknown value '{value}', expected one of: {}", allowed.join(", "))
            }
            FieldErrorKind::InvalidFormat { value, expected } => {
                write!(f, "'{value}' is not a valid {expected}")
            }
            FieldErrorKind::UnresolvedPlaceholder { name } => {
                write!(f, "placeholder %{name}% has no value in the environment")
            }
            FieldErrorKind::DisallowedPlaceholder { name } => write!(
                f,
                "placeholder %{name}% is not an allowed variable \
                 (enable unrestricted placeholders to resolve it)"
            ),
            FieldErrorKind::UnknownField => f.write_str("unknown field"),
        }
    }
}
