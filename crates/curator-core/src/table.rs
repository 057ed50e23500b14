//! Raw table metadata and rows as supplied by the layer-0 store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the ingestion-assigned identifier column rows are ordered by.
pub const RECORD_ID_COLUMN: &str = "record_id";

/// Storage type of a raw column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Text,
    Integer,
    Real,
    Boolean,
}

/// Description of one column of an uploaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub unit: Option<String>,
    /// Unified Content Descriptor, e.g. `pos.eq.ra`.
    #[serde(default)]
    pub ucd: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_primary_key: bool,
}

impl ColumnDescription {
    /// Create a column with the given name and type.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            unit: None,
            ucd: None,
            description: None,
            is_primary_key: false,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_ucd(mut self, ucd: impl Into<String>) -> Self {
        self.ucd = Some(ucd.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }
}

/// Metadata of an uploaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub table_id: i64,
    pub table_name: String,
    pub columns: Vec<ColumnDescription>,
}

impl TableMeta {
    pub fn new(table_id: i64, table_name: impl Into<String>) -> Self {
        Self {
            table_id,
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDescription) -> Self {
        self.columns.push(column);
        self
    }
}

/// One raw row keyed by its ingestion-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub record_id: String,
    pub values: BTreeMap<String, Value>,
}

impl RawRow {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, column: impl Into<String>, value: Value) -> Self {
        self.values.insert(column.into(), value);
        self
    }
}

/// Row counts and timestamps used to skip already processed tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableStatistics {
    pub total_rows: u64,
    pub total_original_rows: u64,
    #[serde(default)]
    pub last_modified_dt: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_processed_dt: Option<DateTime<Utc>>,
}

impl TableStatistics {
    /// True when the whole table was ingested and nothing changed since the
    /// last completed crossmatch.
    pub fn is_up_to_date(&self) -> bool {
        if self.total_rows != self.total_original_rows {
            return false;
        }
        match (self.last_modified_dt, self.last_processed_dt) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(modified), Some(processed)) => modified <= processed,
        }
    }
}
