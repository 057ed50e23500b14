//! Column filters select the source columns a rule applies to.

use std::collections::BTreeMap;

use crate::error::ConfigurationError;
use crate::table::{ColumnDescription, TableMeta};

/// Predicate over a column and the table it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    /// Column's UCD equals the given tag.
    Ucd(String),
    /// Column's name equals the given name.
    ColumnName(String),
    /// The owning table's name equals the given name.
    TableName(String),
    /// Every sub-filter passes. An empty conjunction accepts everything.
    And(Vec<ColumnFilter>),
}

impl ColumnFilter {
    pub fn apply(&self, table: &TableMeta, column: &ColumnDescription) -> bool {
        match self {
            ColumnFilter::Ucd(ucd) => column.ucd.as_deref() == Some(ucd.as_str()),
            ColumnFilter::ColumnName(name) => column.name == *name,
            ColumnFilter::TableName(name) => table.table_name == *name,
            ColumnFilter::And(filters) => filters.iter().all(|f| f.apply(table, column)),
        }
    }
}

/// Build a conjunction from a flat `key -> value` specification.
///
/// Recognised keys are `ucd`, `column_name` and `table_name`.
pub fn parse_filters(spec: &BTreeMap<String, String>) -> Result<ColumnFilter, ConfigurationError> {
    let filters = spec
        .iter()
        .map(|(key, value)| match key.as_str() {
            "ucd" => Ok(ColumnFilter::Ucd(value.clone())),
            "column_name" => Ok(ColumnFilter::ColumnName(value.clone())),
            "table_name" => Ok(ColumnFilter::TableName(value.clone())),
            _ => Err(ConfigurationError::UnknownFilter { key: key.clone() }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ColumnFilter::And(filters))
}
