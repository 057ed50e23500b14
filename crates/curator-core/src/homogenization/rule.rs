//! Homogenization rules and constant parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::{parse_filters, ColumnFilter};
use crate::catalog::RawCatalog;
use crate::error::ConfigurationError;

/// Maps columns accepted by `filter` onto `parameter` of the object
/// identified by `(catalog, key)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HomogenizationRule {
    pub catalog: RawCatalog,
    pub parameter: String,
    /// Distinguishes several objects of one family in a single row.
    pub key: String,
    pub filter: ColumnFilter,
    pub priority: i32,
}

impl HomogenizationRule {
    pub fn new(catalog: RawCatalog, parameter: impl Into<String>, filter: ColumnFilter) -> Self {
        Self {
            catalog,
            parameter: parameter.into(),
            key: String::new(),
            filter,
            priority: 0,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Declarative form of a rule, with filters as a flat key/value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub catalog: RawCatalog,
    pub parameter: String,
    #[serde(default)]
    pub key: String,
    pub filters: BTreeMap<String, String>,
    #[serde(default)]
    pub priority: i32,
}

impl RuleSpec {
    /// Resolve the filter map into a typed rule.
    pub fn into_rule(self) -> Result<HomogenizationRule, ConfigurationError> {
        Ok(HomogenizationRule {
            catalog: self.catalog,
            parameter: self.parameter,
            key: self.key,
            filter: parse_filters(&self.filters)?,
            priority: self.priority,
        })
    }
}

/// Constant parameters applied to every row of an object group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomogenizationParams {
    pub catalog: RawCatalog,
    #[serde(default)]
    pub key: String,
    pub params: BTreeMap<String, Value>,
}

impl HomogenizationParams {
    pub fn new(catalog: RawCatalog) -> Self {
        Self {
            catalog,
            key: String::new(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}
