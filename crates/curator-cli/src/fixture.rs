//! JSON fixtures describing one upload and the reference catalog.
//!
//! A fixture holds everything a curation pass reads: the raw table with
//! its rows, the homogenization rules and constants, and the layer-2
//! objects to crossmatch against.
//!
//! ```json
//! {
//!   "table": {"table_id": 1, "table_name": "upload", "columns": [...]},
//!   "rows": [{"record_id": "...", "values": {"ra": 10.68}}],
//!   "rules": [{"catalog": "icrs", "parameter": "ra", "filters": {"ucd": "pos.eq.ra"}}],
//!   "params": [{"catalog": "icrs", "params": {"e_ra": 0.1}}],
//!   "reference": [{"pgc": 2557, "data": [{"catalog": "designation", "design": "M31"}]}]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use curator_core::{
    HomogenizationParams, Layer2Object, MemoryLayer0Repository, MemoryLayer2Repository, RawRow,
    RuleSpec, TableMeta, TableStatistics,
};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub table: TableMeta,
    #[serde(default)]
    pub rows: Vec<RawRow>,
    /// Overrides the statistics of a freshly ingested table.
    #[serde(default)]
    pub statistics: Option<TableStatistics>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    #[serde(default)]
    pub params: Vec<HomogenizationParams>,
    #[serde(default)]
    pub reference: Vec<Layer2Object>,
}

/// Repositories seeded from a fixture.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub layer0: Arc<MemoryLayer0Repository>,
    pub layer2: Arc<MemoryLayer2Repository>,
}

impl Fixture {
    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        serde_json::from_str(&source).map_err(|source| CliError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn table_id(&self) -> i64 {
        self.table.table_id
    }

    /// Seed in-memory repositories. Rule filters are resolved here, so an
    /// unknown filter key fails before any row is read.
    pub fn into_repositories(self) -> Result<Repositories> {
        let rules = self
            .rules
            .into_iter()
            .map(RuleSpec::into_rule)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let layer0 = Arc::new(MemoryLayer0Repository::new());
        let table_id = self.table.table_id;
        layer0.add_table(self.table, self.rows);
        if let Some(statistics) = self.statistics {
            layer0
                .set_statistics(table_id, statistics)
                .map_err(curator_core::Error::from)?;
        }
        layer0.set_rules(rules);
        layer0.set_params(self.params);

        Ok(Repositories {
            layer0,
            layer2: Arc::new(MemoryLayer2Repository::with_objects(self.reference)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::{Layer0Repository, RawCatalog};
    use std::io::Write;

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_minimal_fixture() {
        let file = write_fixture(
            r#"{"table": {"table_id": 7, "table_name": "empty", "columns": []}}"#,
        );
        let fixture = Fixture::load(file.path()).unwrap();
        assert_eq!(fixture.table_id(), 7);
        assert!(fixture.rows.is_empty());
        assert!(fixture.reference.is_empty());
    }

    #[test]
    fn test_rules_resolved_into_repository() {
        let file = write_fixture(
            r#"{
                "table": {"table_id": 3, "table_name": "names", "columns": []},
                "rules": [{"catalog": "designation", "parameter": "design",
                           "filters": {"column_name": "name"}, "priority": 2}]
            }"#,
        );
        let repos = Fixture::load(file.path()).unwrap().into_repositories().unwrap();
        let rules = repos.layer0.get_homogenization_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].catalog, RawCatalog::Designation);
        assert_eq!(rules[0].priority, 2);
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let file = write_fixture(
            r#"{
                "table": {"table_id": 3, "table_name": "names", "columns": []},
                "rules": [{"catalog": "designation", "parameter": "design",
                           "filters": {"colour": "red"}}]
            }"#,
        );
        let err = Fixture::load(file.path()).unwrap().into_repositories().unwrap_err();
        assert!(matches!(err, CliError::Configuration(_)));
    }

    #[test]
    fn test_malformed_json_names_path() {
        let file = write_fixture("{not json");
        let err = Fixture::load(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
