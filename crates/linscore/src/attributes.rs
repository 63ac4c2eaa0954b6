//! Typed operator attributes and node definitions.
//!
//! A node definition carries the operator name, its domain and a map of
//! named attributes. Kernels read their configuration through the typed
//! getters on [`Attributes`], which distinguish a missing attribute from one
//! of the wrong kind.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "op_type": "LinearRegressor",
//!   "domain": "ai.onnx.ml",
//!   "attributes": {
//!     "targets": { "type": "int", "value": 1 },
//!     "coefficients": { "type": "floats", "value": [2.0, 3.0] },
//!     "intercepts": { "type": "floats", "value": [1.0] },
//!     "post_transform": { "type": "string", "value": "NONE" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Int(i64),
    Float(f32),
    String(String),
    Ints(Vec<i64>),
    Floats(Vec<f32>),
    Strings(Vec<String>),
}

impl AttributeValue {
    /// Name of the value kind, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Int(_) => "int",
            AttributeValue::Float(_) => "float",
            AttributeValue::String(_) => "string",
            AttributeValue::Ints(_) => "ints",
            AttributeValue::Floats(_) => "floats",
            AttributeValue::Strings(_) => "strings",
        }
    }
}

/// Named attributes of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // =========================================================================
    // Typed getters
    // =========================================================================

    /// Required integer attribute.
    pub fn int(&self, name: &str) -> Result<i64, ConfigError> {
        self.int_opt(name)?
            .ok_or_else(|| ConfigError::MissingAttribute(name.to_string()))
    }

    /// Integer attribute falling back to `default` when absent.
    pub fn int_or(&self, name: &str, default: i64) -> Result<i64, ConfigError> {
        Ok(self.int_opt(name)?.unwrap_or(default))
    }

    /// Float attribute falling back to `default` when absent.
    pub fn float_or(&self, name: &str, default: f32) -> Result<f32, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(AttributeValue::Float(v)) => Ok(*v),
            Some(other) => Err(type_error(name, "float", other)),
        }
    }

    /// String attribute falling back to `default` when absent.
    pub fn string_or<'a>(&'a self, name: &str, default: &'a str) -> Result<&'a str, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(AttributeValue::String(v)) => Ok(v),
            Some(other) => Err(type_error(name, "string", other)),
        }
    }

    /// Required float-list attribute.
    pub fn floats(&self, name: &str) -> Result<&[f32], ConfigError> {
        match self.get(name) {
            None => Err(ConfigError::MissingAttribute(name.to_string())),
            Some(AttributeValue::Floats(v)) => Ok(v),
            Some(other) => Err(type_error(name, "floats", other)),
        }
    }

    /// Float-list attribute, empty when absent.
    pub fn floats_or_empty(&self, name: &str) -> Result<&[f32], ConfigError> {
        match self.get(name) {
            None => Ok(&[]),
            Some(AttributeValue::Floats(v)) => Ok(v),
            Some(other) => Err(type_error(name, "floats", other)),
        }
    }

    fn int_opt(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        match self.get(name) {
            None => Ok(None),
            Some(AttributeValue::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(type_error(name, "int", other)),
        }
    }
}

impl FromIterator<(String, AttributeValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn type_error(name: &str, expected: &'static str, actual: &AttributeValue) -> ConfigError {
    ConfigError::AttributeType {
        name: name.to_string(),
        expected,
        actual: actual.kind(),
    }
}

// =============================================================================
// Node Definition
// =============================================================================

/// One operator node of a model: what to run and how it is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub op_type: String,
    /// Operator domain; empty string is the default domain.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl NodeDef {
    pub fn new(op_type: impl Into<String>, domain: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            op_type: op_type.into(),
            domain: domain.into(),
            attributes,
        }
    }

    /// Parse a node definition from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
