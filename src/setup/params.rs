//! Free-form parameters for custom condition and action kinds.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

/// A single parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Named parameters handed to a kind factory.
///
/// Accessors take the kind name so errors say which kind rejected the value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(FxHashMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder pattern).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn invalid(kind: &str, key: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidParameter {
            kind: kind.to_string(),
            param: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// A required number. Integers are accepted.
    pub fn f64(&self, kind: &str, key: &str) -> Result<f64, ConfigError> {
        match self.get(key) {
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(ParamValue::Int(v)) => Ok(*v as f64),
            Some(_) => Err(Self::invalid(kind, key, "expected a number")),
            None => Err(Self::invalid(kind, key, "missing")),
        }
    }

    /// An optional number with a default.
    pub fn f64_or(&self, kind: &str, key: &str, default: f64) -> Result<f64, ConfigError> {
        if self.contains(key) {
            self.f64(kind, key)
        } else {
            Ok(default)
        }
    }

    /// A required integer.
    pub fn int(&self, kind: &str, key: &str) -> Result<i64, ConfigError> {
        match self.get(key) {
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(_) => Err(Self::invalid(kind, key, "expected an integer")),
            None => Err(Self::invalid(kind, key, "missing")),
        }
    }

    /// A required string.
    pub fn text(&self, kind: &str, key: &str) -> Result<&str, ConfigError> {
        match self.get(key) {
            Some(ParamValue::Text(v)) => Ok(v),
            Some(_) => Err(Self::invalid(kind, key, "expected a string")),
            None => Err(Self::invalid(kind, key, "missing")),
        }
    }

    /// An optional flag with a default.
    pub fn bool_or(&self, kind: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(_) => Err(Self::invalid(kind, key, "expected a boolean")),
            None => Ok(default),
        }
    }
}
