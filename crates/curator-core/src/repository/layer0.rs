//! Raw-upload storage (layer 0).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::catalog::{CatalogObject, RawCatalog};
use crate::crossmatch::CIResult;
use crate::error::RepositoryError;
use crate::homogenization::{HomogenizationParams, HomogenizationRule};
use crate::table::{RawRow, TableMeta, TableStatistics};

/// Trait for raw-upload storage backends.
pub trait Layer0Repository: Send + Sync {
    /// Column metadata of a table.
    fn fetch_metadata(&self, table_id: i64) -> Result<TableMeta, RepositoryError>;

    /// Row counts and modification times of a table.
    fn get_table_statistics(&self, table_id: i64) -> Result<TableStatistics, RepositoryError>;

    /// Up to `limit` rows ordered by `order_column`.
    ///
    /// `offset` is an exclusive lower bound on the record id: only rows
    /// strictly after it are returned.
    fn fetch_raw_data(
        &self,
        table_id: i64,
        limit: usize,
        offset: Option<&str>,
        order_column: &str,
    ) -> Result<Vec<RawRow>, RepositoryError>;

    /// Insert or replace objects of a single family, keyed by record id.
    fn upsert_objects(
        &self,
        table_id: i64,
        catalog: RawCatalog,
        objects: Vec<(String, CatalogObject)>,
    ) -> Result<(), RepositoryError>;

    /// Persist classification outcomes, keyed by record id.
    fn add_crossmatch_result(
        &self,
        results: &BTreeMap<String, CIResult>,
    ) -> Result<(), RepositoryError>;

    fn get_homogenization_rules(&self) -> Result<Vec<HomogenizationRule>, RepositoryError>;

    fn get_homogenization_params(&self) -> Result<Vec<HomogenizationParams>, RepositoryError>;

    /// Record when a table was last fully processed.
    fn set_last_processed(&self, table_id: i64, at: DateTime<Utc>) -> Result<(), RepositoryError>;
}
