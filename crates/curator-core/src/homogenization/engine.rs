//! Column-to-parameter resolution and row conversion.

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use super::rule::{HomogenizationParams, HomogenizationRule};
use crate::catalog::{CatalogObject, ParamValue, Params, RawCatalog, Record};
use crate::error::{ConstructionError, ConversionError};
use crate::table::{ColumnDescription, RawRow, TableMeta};
use crate::units::Unit;

/// Identifies one catalog object produced per row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub catalog: RawCatalog,
    pub key: String,
}

impl ObjectKey {
    pub fn new(catalog: RawCatalog, key: impl Into<String>) -> Self {
        Self {
            catalog,
            key: key.into(),
        }
    }
}

/// The column chosen for a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    pub column: String,
    pub unit: Unit,
    pub priority: i32,
}

#[derive(Debug, Clone, Default)]
struct ObjectGroup {
    columns: BTreeMap<String, ColumnMapping>,
    constants: Params,
}

impl ObjectGroup {
    /// Gather constructor parameters for a row.
    ///
    /// Column values win over constants. The flag tells whether any mapped
    /// column held a value at all.
    fn params_for(&self, row: &RawRow) -> (Params, bool) {
        let mut params = Params::new();
        for (parameter, mapping) in &self.columns {
            let value = row
                .values
                .get(&mapping.column)
                .and_then(|cell| ParamValue::from_cell(cell, mapping.unit));
            if let Some(value) = value {
                params.insert(parameter.clone(), value);
            }
        }

        let supplied = !params.is_empty();
        for (name, value) in &self.constants {
            params.entry(name.clone()).or_insert_with(|| value.clone());
        }
        (params, supplied)
    }
}

/// A resolved mapping from a table's columns to catalog objects.
#[derive(Debug, Clone)]
pub struct Homogenization {
    groups: BTreeMap<ObjectKey, ObjectGroup>,
    ignore_errors: bool,
}

/// Resolve `rules` against the columns of `table`.
///
/// For every `(catalog, key, parameter)` only the column matched by the
/// rule with the strictly greatest priority is kept; on equal priority the
/// first mapping seen (columns in table order, rules in list order) stays.
/// Constant `params` are attached to object groups that have at least one
/// column mapping.
pub fn get_homogenization(
    rules: &[HomogenizationRule],
    params: &[HomogenizationParams],
    table: &TableMeta,
) -> Result<Homogenization, ConversionError> {
    let mut winners: BTreeMap<(ObjectKey, String), (&ColumnDescription, i32)> = BTreeMap::new();

    for column in &table.columns {
        for rule in rules {
            if !rule.filter.apply(table, column) {
                continue;
            }
            let slot = (ObjectKey::new(rule.catalog, rule.key.clone()), rule.parameter.clone());
            match winners.get(&slot) {
                Some((current, priority)) if rule.priority <= *priority => {
                    trace!(
                        column = %column.name,
                        kept = %current.name,
                        catalog = %rule.catalog,
                        parameter = %rule.parameter,
                        "column loses to an earlier mapping of equal or higher priority"
                    );
                }
                _ => {
                    debug!(
                        column = %column.name,
                        catalog = %rule.catalog,
                        key = %rule.key,
                        parameter = %rule.parameter,
                        priority = rule.priority,
                        "column mapped"
                    );
                    winners.insert(slot, (column, rule.priority));
                }
            }
        }
    }

    if winners.is_empty() {
        return Err(ConversionError::NoColumnsMatched {
            table: table.table_name.clone(),
        });
    }

    let mut groups: BTreeMap<ObjectKey, ObjectGroup> = BTreeMap::new();
    for ((object_key, parameter), (column, priority)) in winners {
        let unit = column
            .unit
            .as_deref()
            .unwrap_or("")
            .parse::<Unit>()
            .map_err(|e| ConversionError::UnknownUnit {
                column: column.name.clone(),
                unit: e.0,
            })?;

        groups.entry(object_key).or_default().columns.insert(
            parameter,
            ColumnMapping {
                column: column.name.clone(),
                unit,
                priority,
            },
        );
    }

    for entry in params {
        let object_key = ObjectKey::new(entry.catalog, entry.key.clone());
        let Some(group) = groups.get_mut(&object_key) else {
            debug!(
                catalog = %entry.catalog,
                key = %entry.key,
                "constant parameters ignored: no column feeds this object"
            );
            continue;
        };
        for (name, value) in &entry.params {
            let value = ParamValue::from_constant(value).map_err(|e| ConversionError::UnknownUnit {
                column: format!("{}[{}].{}", entry.catalog, entry.key, name),
                unit: e.0,
            })?;
            if let Some(value) = value {
                group.constants.insert(name.clone(), value);
            }
        }
    }

    Ok(Homogenization {
        groups,
        ignore_errors: true,
    })
}

impl Homogenization {
    /// Choose whether per-row construction failures are skipped (the
    /// default) or returned.
    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }

    pub fn ignore_errors(&self) -> bool {
        self.ignore_errors
    }

    /// The column selected for a parameter, if any.
    pub fn mapping(&self, object: &ObjectKey, parameter: &str) -> Option<&ColumnMapping> {
        self.groups.get(object)?.columns.get(parameter)
    }

    /// Object groups produced per row, in output order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectKey> {
        self.groups.keys()
    }

    /// Convert raw rows into records.
    ///
    /// A group whose mapped columns are all empty in a row produces no
    /// object for that row. Rows that end up with no objects are dropped.
    pub fn apply(&self, rows: &[RawRow]) -> Result<Vec<Record>, ConstructionError> {
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let mut data = Vec::with_capacity(self.groups.len());

            for (object_key, group) in &self.groups {
                let (params, supplied) = group.params_for(row);
                if !supplied {
                    continue;
                }
                match CatalogObject::from_params(object_key.catalog, &params) {
                    Ok(object) => data.push(object),
                    Err(e) if self.ignore_errors => {
                        warn!(
                            record_id = %row.record_id,
                            catalog = %object_key.catalog,
                            key = %object_key.key,
                            error = %e,
                            "skipping catalog object"
                        );
                    }
                    Err(e) => return Err(e),
                }
            }

            if data.is_empty() {
                debug!(record_id = %row.record_id, "row produced no catalog objects");
                continue;
            }
            records.push(Record::new(row.record_id.clone(), data));
        }

        Ok(records)
    }
}
