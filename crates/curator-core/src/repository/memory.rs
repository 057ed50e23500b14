//! In-memory repositories for tests, fixtures and the command line.

use std::collections::BTreeMap;
use std::ops::Bound;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::layer0::Layer0Repository;
use super::layer2::{Layer2Repository, SearchKey, SearchParams};
use crate::catalog::{CatalogObject, CatalogView, Layer2Object, RawCatalog};
use crate::crossmatch::CIResult;
use crate::error::RepositoryError;
use crate::homogenization::{HomogenizationParams, HomogenizationRule};
use crate::table::{RawRow, TableMeta, TableStatistics, RECORD_ID_COLUMN};
use crate::units::angular_separation_arcsec;

#[derive(Debug)]
struct MemoryTable {
    meta: TableMeta,
    rows: BTreeMap<String, RawRow>,
    statistics: TableStatistics,
}

/// Layer-0 repository backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryLayer0Repository {
    tables: RwLock<BTreeMap<i64, MemoryTable>>,
    rules: RwLock<Vec<HomogenizationRule>>,
    params: RwLock<Vec<HomogenizationParams>>,
    objects: RwLock<BTreeMap<(i64, RawCatalog), BTreeMap<String, CatalogObject>>>,
    results: RwLock<BTreeMap<String, CIResult>>,
    rejected: RwLock<Option<RawCatalog>>,
}

impl MemoryLayer0Repository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with its rows.
    ///
    /// Statistics start as a fully ingested, never processed table.
    pub fn add_table(&self, meta: TableMeta, rows: Vec<RawRow>) {
        let count = rows.len() as u64;
        let table = MemoryTable {
            meta,
            rows: rows
                .into_iter()
                .map(|row| (row.record_id.clone(), row))
                .collect(),
            statistics: TableStatistics {
                total_rows: count,
                total_original_rows: count,
                last_modified_dt: Some(Utc::now()),
                last_processed_dt: None,
            },
        };
        self.tables.write().insert(table.meta.table_id, table);
    }

    /// Replace a table's statistics.
    pub fn set_statistics(
        &self,
        table_id: i64,
        statistics: TableStatistics,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&table_id)
            .ok_or(RepositoryError::TableNotFound(table_id))?;
        table.statistics = statistics;
        Ok(())
    }

    pub fn set_rules(&self, rules: Vec<HomogenizationRule>) {
        *self.rules.write() = rules;
    }

    pub fn set_params(&self, params: Vec<HomogenizationParams>) {
        *self.params.write() = params;
    }

    /// Make every upsert of `catalog` fail, or clear the failure with `None`.
    pub fn reject_upserts(&self, catalog: Option<RawCatalog>) {
        *self.rejected.write() = catalog;
    }

    /// Stored objects of one family, keyed by record id.
    pub fn objects(&self, table_id: i64, catalog: RawCatalog) -> BTreeMap<String, CatalogObject> {
        self.objects
            .read()
            .get(&(table_id, catalog))
            .cloned()
            .unwrap_or_default()
    }

    /// Every classification written so far.
    pub fn crossmatch_results(&self) -> BTreeMap<String, CIResult> {
        self.results.read().clone()
    }
}

impl Layer0Repository for MemoryLayer0Repository {
    fn fetch_metadata(&self, table_id: i64) -> Result<TableMeta, RepositoryError> {
        self.tables
            .read()
            .get(&table_id)
            .map(|t| t.meta.clone())
            .ok_or(RepositoryError::TableNotFound(table_id))
    }

    fn get_table_statistics(&self, table_id: i64) -> Result<TableStatistics, RepositoryError> {
        self.tables
            .read()
            .get(&table_id)
            .map(|t| t.statistics.clone())
            .ok_or(RepositoryError::TableNotFound(table_id))
    }

    fn fetch_raw_data(
        &self,
        table_id: i64,
        limit: usize,
        offset: Option<&str>,
        order_column: &str,
    ) -> Result<Vec<RawRow>, RepositoryError> {
        if order_column != RECORD_ID_COLUMN {
            return Err(RepositoryError::Backend(format!(
                "cannot order by '{}'",
                order_column
            )));
        }

        let tables = self.tables.read();
        let table = tables
            .get(&table_id)
            .ok_or(RepositoryError::TableNotFound(table_id))?;
        let lower = match offset {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };

        Ok(table
            .rows
            .range::<str, _>((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn upsert_objects(
        &self,
        table_id: i64,
        catalog: RawCatalog,
        objects: Vec<(String, CatalogObject)>,
    ) -> Result<(), RepositoryError> {
        if *self.rejected.read() == Some(catalog) {
            return Err(RepositoryError::Backend(format!(
                "writes to {} are rejected",
                catalog
            )));
        }
        if let Some((id, object)) = objects.iter().find(|(_, o)| o.catalog() != catalog) {
            return Err(RepositoryError::Backend(format!(
                "record {}: {} object written as {}",
                id,
                object.catalog(),
                catalog
            )));
        }

        self.objects
            .write()
            .entry((table_id, catalog))
            .or_default()
            .extend(objects);
        Ok(())
    }

    fn add_crossmatch_result(
        &self,
        results: &BTreeMap<String, CIResult>,
    ) -> Result<(), RepositoryError> {
        self.results
            .write()
            .extend(results.iter().map(|(id, r)| (id.clone(), r.clone())));
        Ok(())
    }

    fn get_homogenization_rules(&self) -> Result<Vec<HomogenizationRule>, RepositoryError> {
        Ok(self.rules.read().clone())
    }

    fn get_homogenization_params(&self) -> Result<Vec<HomogenizationParams>, RepositoryError> {
        Ok(self.params.read().clone())
    }

    fn set_last_processed(&self, table_id: i64, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&table_id)
            .ok_or(RepositoryError::TableNotFound(table_id))?;
        table.statistics.last_processed_dt = Some(at);
        Ok(())
    }
}

/// Layer-2 repository over a list of reference objects.
#[derive(Debug, Default)]
pub struct MemoryLayer2Repository {
    objects: RwLock<Vec<Layer2Object>>,
}

impl MemoryLayer2Repository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(objects: Vec<Layer2Object>) -> Self {
        Self {
            objects: RwLock::new(objects),
        }
    }

    pub fn insert(&self, object: Layer2Object) {
        self.objects.write().push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

fn matches_search(object: &Layer2Object, search: &SearchParams) -> bool {
    match search {
        SearchParams::Designation { design } => object.data.iter().any(|o| match o {
            CatalogObject::Designation(d) => d.design.eq_ignore_ascii_case(design),
            _ => false,
        }),
        SearchParams::Icrs {
            ra,
            dec,
            radius_arcsec,
        } => object
            .positions()
            .iter()
            .any(|p| angular_separation_arcsec(p.ra, p.dec, *ra, *dec) <= *radius_arcsec),
    }
}

impl Layer2Repository for MemoryLayer2Repository {
    fn query_batch(
        &self,
        catalogs: &[RawCatalog],
        searches: &BTreeMap<SearchKey, SearchParams>,
        limit: usize,
        offset: usize,
    ) -> Result<BTreeMap<SearchKey, Vec<Layer2Object>>, RepositoryError> {
        let objects = self.objects.read();
        let mut found = BTreeMap::new();

        for (key, search) in searches {
            let hits: Vec<Layer2Object> = objects
                .iter()
                .filter(|o| matches_search(o, search))
                .skip(offset)
                .take(limit)
                .map(|o| o.restricted_to(catalogs))
                .collect();
            if !hits.is_empty() {
                found.insert(key.clone(), hits);
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DesignationObject, IcrsObject, PgcObject};
    use crate::table::{ColumnDescription, DataType};
    use serde_json::json;

    fn table() -> TableMeta {
        TableMeta::new(7, "hyperleda").with_column(ColumnDescription::new("name", DataType::Text))
    }

    fn rows(ids: &[&str]) -> Vec<RawRow> {
        ids.iter()
            .map(|id| RawRow::new(*id).with_value("name", json!(format!("obj-{}", id))))
            .collect()
    }

    #[test]
    fn test_fetch_raw_data_cursor() {
        let repo = MemoryLayer0Repository::new();
        repo.add_table(table(), rows(&["c", "a", "d", "b"]));

        let first = repo.fetch_raw_data(7, 2, None, RECORD_ID_COLUMN).unwrap();
        let ids: Vec<&str> = first.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let next = repo.fetch_raw_data(7, 2, Some("b"), RECORD_ID_COLUMN).unwrap();
        let ids: Vec<&str> = next.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);

        assert!(repo.fetch_raw_data(7, 2, Some("d"), RECORD_ID_COLUMN).unwrap().is_empty());
        assert!(repo.fetch_raw_data(7, 2, None, "name").is_err());
        assert_eq!(
            repo.fetch_raw_data(8, 2, None, RECORD_ID_COLUMN).unwrap_err(),
            RepositoryError::TableNotFound(8)
        );
    }

    #[test]
    fn test_upsert_rejects_wrong_family() {
        let repo = MemoryLayer0Repository::new();
        let object = CatalogObject::Pgc(PgcObject::new(1).unwrap());

        assert!(repo
            .upsert_objects(1, RawCatalog::Designation, vec![("a".to_string(), object.clone())])
            .is_err());
        repo.upsert_objects(1, RawCatalog::Pgc, vec![("a".to_string(), object.clone())])
            .unwrap();
        assert_eq!(repo.objects(1, RawCatalog::Pgc).get("a"), Some(&object));
    }

    #[test]
    fn test_set_last_processed() {
        let repo = MemoryLayer0Repository::new();
        repo.add_table(table(), rows(&["a"]));
        assert!(!repo.get_table_statistics(7).unwrap().is_up_to_date());

        repo.set_last_processed(7, Utc::now()).unwrap();
        assert!(repo.get_table_statistics(7).unwrap().is_up_to_date());
    }

    #[test]
    fn test_layer2_searches() {
        let repo = MemoryLayer2Repository::with_objects(vec![
            Layer2Object::new(
                1,
                vec![
                    CatalogObject::Designation(DesignationObject::new("M33").unwrap()),
                    CatalogObject::Icrs(IcrsObject::new(23.46, 30.66, 0.001, 0.001).unwrap()),
                ],
            ),
            Layer2Object::new(
                2,
                vec![CatalogObject::Icrs(
                    IcrsObject::new(10.68, 41.27, 0.001, 0.001).unwrap(),
                )],
            ),
        ]);

        let by_name = SearchParams::Designation {
            design: "m33".to_string(),
        };
        let by_position = SearchParams::Icrs {
            ra: 10.68,
            dec: 41.27 + 2.0 / 3600.0,
            radius_arcsec: 5.0,
        };
        let searches: BTreeMap<SearchKey, SearchParams> = [
            (SearchKey::new("r1", &by_name), by_name),
            (SearchKey::new("r2", &by_position), by_position),
        ]
        .into_iter()
        .collect();

        let found = repo
            .query_batch(&[RawCatalog::Designation], &searches, 10, 0)
            .unwrap();

        let names = &found[&SearchKey {
            record_id: "r1".to_string(),
            dimension: "designation",
        }];
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].pgc, 1);
        assert!(names[0].icrs().is_none());

        let cone = &found[&SearchKey {
            record_id: "r2".to_string(),
            dimension: "icrs",
        }];
        assert_eq!(cone.iter().map(|o| o.pgc).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_cone_search_checks_every_position() {
        let repo = MemoryLayer2Repository::with_objects(vec![Layer2Object::new(
            3,
            vec![
                CatalogObject::Icrs(IcrsObject::new(359.9999, 0.0, 0.001, 0.001).unwrap()),
                CatalogObject::Icrs(IcrsObject::new(0.0001, 0.0, 0.001, 0.001).unwrap()),
            ],
        )]);
        let cone = SearchParams::Icrs {
            ra: 0.0,
            dec: 0.0,
            radius_arcsec: 5.0,
        };
        let searches: BTreeMap<SearchKey, SearchParams> =
            [(SearchKey::new("r", &cone), cone)].into_iter().collect();

        let found = repo.query_batch(&RawCatalog::ALL, &searches, 10, 0).unwrap();
        let hits = &found[&SearchKey {
            record_id: "r".to_string(),
            dimension: "icrs",
        }];
        assert_eq!(hits.iter().map(|o| o.pgc).collect::<Vec<_>>(), vec![3]);
    }
}
