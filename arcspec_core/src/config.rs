//! Flat key-value configuration records.
//!
//! A `ConfigRecord` is handed from the caller to a parser unchanged. The core only
//! reads the handful of keys it documents; everything else is passed through for the
//! backend to interpret.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key selecting the backend type in the registry.
pub const RESPONSE_TYPE_KEY: &str = "ResponseType";

/// Key flagging a multimodal model; accepted as a bool or a model name.
pub const MULTIMODAL_KEY: &str = "it_multimodal_model";

/// Errors raised while reading configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required configuration key '{0}' is missing")]
    MissingKey(String),

    #[error("configuration key '{key}' is invalid: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// An opaque configuration record (flat map of string keys to JSON values).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigRecord(Map<String, Value>);

impl ConfigRecord {
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set a key, returning the record for chaining.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Optional string value. A present non-string value is an error.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(ConfigError::invalid(
                key,
                format!("expected a string, found {other}"),
            )),
        }
    }

    /// String value with a default.
    pub fn str_or(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self.get_str(key)?.unwrap_or(default).to_string())
    }

    /// Required, non-blank string value.
    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        match self.get_str(key)? {
            Some(s) if !s.trim().is_empty() => Ok(s),
            Some(_) => Err(ConfigError::invalid(key, "must not be empty")),
            None => Err(ConfigError::MissingKey(key.to_string())),
        }
    }

    /// Optional numeric value.
    pub fn get_f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| {
                ConfigError::invalid(key, format!("expected a number, found {v}"))
            }),
        }
    }

    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        Ok(self.get_f64(key)?.unwrap_or(default))
    }

    /// Optional boolean. The strings `"true"`/`"false"` are accepted as well, since
    /// hand-written profiles often quote flags.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(other) => Err(ConfigError::invalid(
                key,
                format!("expected a boolean, found {other}"),
            )),
        }
    }

    /// Loose switch: `true`, or any non-empty string other than `"false"` (profiles
    /// sometimes put a model name where a flag is expected).
    #[must_use]
    pub fn is_enabled(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.trim().is_empty() && !s.eq_ignore_ascii_case("false"),
            _ => false,
        }
    }

    /// Optional non-negative integer.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| {
                ConfigError::invalid(key, format!("expected a non-negative integer, found {v}"))
            }),
        }
    }

    /// Integer that must be strictly positive, with a default when absent.
    pub fn positive_usize_or(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        let Some(v) = self.get(key) else {
            return Ok(default);
        };
        let n = v
            .as_i64()
            .ok_or_else(|| ConfigError::invalid(key, format!("expected an integer, found {v}")))?;
        if n <= 0 {
            return Err(ConfigError::invalid(key, format!("must be > 0, got {n}")));
        }
        usize::try_from(n).map_err(|_| ConfigError::invalid(key, "out of range"))
    }

    /// Optional JSON object; absent yields an empty map.
    pub fn object_or_empty(&self, key: &str) -> Result<Map<String, Value>, ConfigError> {
        match self.get(key) {
            None => Ok(Map::new()),
            Some(Value::Object(m)) => Ok(m.clone()),
            Some(other) => Err(ConfigError::invalid(
                key,
                format!("expected an object, found {other}"),
            )),
        }
    }
}

impl From<Map<String, Value>> for ConfigRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ConfigRecord {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ConfigError::invalid(
                "<root>",
                format!("expected a JSON object, found {other}"),
            )),
        }
    }
}
