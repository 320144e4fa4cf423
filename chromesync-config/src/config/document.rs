//! Document formats and the override merge.
//!
//! Every supported format is parsed into a `serde_json::Value` tree so that
//! merging and field checks work the same regardless of the file type.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Structured text formats a config document may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Format implied by the file extension, if recognised.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "toml" => Some(DocumentFormat::Toml),
            _ => None,
        }
    }

    /// Like [`Self::from_extension`], falling back to JSON.
    pub fn for_path(path: &Path) -> Self {
        Self::from_extension(path).unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentFormat::Json => "JSON",
            DocumentFormat::Yaml => "YAML",
            DocumentFormat::Toml => "TOML",
        }
    }

    /// Parse `text` into a document tree whose root is a mapping.
    pub fn parse(self, text: &str) -> Result<Value, ConfigError> {
        let malformed = |message: String| ConfigError::Malformed {
            format: self,
            message,
        };

        let value: Value = match self {
            DocumentFormat::Json => serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?,
            DocumentFormat::Yaml => {
                // An empty YAML file is an empty document rather than `null`.
                if text.trim().is_empty() {
                    return Ok(Value::Object(Map::new()));
                }
                serde_yaml_ng::from_str(text).map_err(|e| malformed(e.to_string()))?
            }
            DocumentFormat::Toml => toml::from_str(text).map_err(|e| malformed(e.to_string()))?,
        };

        if !value.is_object() {
            return Err(malformed(format!(
                "top level must be a mapping of sections, found {}",
                json_type_name(&value)
            )));
        }
        Ok(value)
    }

    /// Parse raw bytes, which must be UTF-8.
    pub fn parse_bytes(self, bytes: &[u8]) -> Result<Value, ConfigError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ConfigError::Malformed {
            format: self,
            message: format!("document is not valid UTF-8: {e}"),
        })?;
        self.parse(text)
    }

    /// Render `value` in this format.
    pub fn render<T: Serialize>(self, value: &T) -> Result<String, ConfigError> {
        let failed = |message: String| ConfigError::Serialize {
            format: self,
            message,
        };
        match self {
            DocumentFormat::Json => {
                let mut text =
                    serde_json::to_string_pretty(value).map_err(|e| failed(e.to_string()))?;
                text.push('\n');
                Ok(text)
            }
            DocumentFormat::Yaml => {
                serde_yaml_ng::to_string(value).map_err(|e| failed(e.to_string()))
            }
            DocumentFormat::Toml => toml::to_string(value).map_err(|e| failed(e.to_string())),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Merge `overlay` into `base`.
///
/// Mappings merge key by key, recursively. A `null` in the overlay removes
/// the key from the result. Any other overlay value (scalar or sequence)
/// replaces the base value outright.
pub fn merge_documents(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    base_map.remove(&key);
                    continue;
                }
                match base_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_documents(existing, value);
                    }
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Human-readable JSON type name used in error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
