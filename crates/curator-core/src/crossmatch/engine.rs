//! Batched candidate lookup, scoring and classification.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::CIResult;
use crate::catalog::{CatalogView, Layer2Object, RawCatalog, Record};
use crate::config::{CrossmatchConfig, DEFAULT_CANDIDATE_LIMIT, DEFAULT_SEARCH_RADIUS_ARCSEC};
use crate::error::{ConfigurationError, RepositoryError};
use crate::plugin::{build, Matcher, MatcherSpec, PluginRegistry, Solver, SolverSpec};
use crate::repository::{Layer2Repository, SearchKey, SearchParams};

/// Classifies records against the reference catalog.
#[derive(Clone)]
pub struct CrossmatchEngine {
    layer2: Arc<dyn Layer2Repository>,
    matcher: MatcherSpec,
    solver: SolverSpec,
    search_radius_arcsec: f64,
    candidate_limit: usize,
}

impl CrossmatchEngine {
    pub fn new(layer2: Arc<dyn Layer2Repository>, matcher: MatcherSpec, solver: SolverSpec) -> Self {
        Self {
            layer2,
            matcher,
            solver,
            search_radius_arcsec: DEFAULT_SEARCH_RADIUS_ARCSEC,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }

    /// Build the matcher and solver trees from configuration.
    ///
    /// Fails before any record is touched if either tree is invalid.
    pub fn from_config(
        layer2: Arc<dyn Layer2Repository>,
        config: &CrossmatchConfig,
        matchers: &PluginRegistry<MatcherSpec>,
        solvers: &PluginRegistry<SolverSpec>,
    ) -> Result<Self, ConfigurationError> {
        let matcher = build(&config.matcher, matchers)?;
        let solver = build(&config.solver, solvers)?;
        Ok(Self::new(layer2, matcher, solver)
            .with_search_radius(config.search_radius_arcsec)
            .with_candidate_limit(config.candidate_limit))
    }

    pub fn with_search_radius(mut self, radius_arcsec: f64) -> Self {
        self.search_radius_arcsec = radius_arcsec;
        self
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    pub fn matcher(&self) -> &MatcherSpec {
        &self.matcher
    }

    pub fn solver(&self) -> &SolverSpec {
        &self.solver
    }

    /// Searchable dimensions of one record.
    pub fn search_params(&self, record: &Record) -> Vec<SearchParams> {
        let mut params = Vec::new();
        if let Some(designation) = record.designation() {
            params.push(SearchParams::Designation {
                design: designation.design,
            });
        }
        if let Some(position) = record.icrs() {
            params.push(SearchParams::Icrs {
                ra: position.ra,
                dec: position.dec,
                radius_arcsec: self.search_radius_arcsec,
            });
        }
        params
    }

    /// Classify every record, querying the reference catalog once for the
    /// whole slice.
    pub fn crossmatch(
        &self,
        records: &[Record],
    ) -> Result<BTreeMap<String, CIResult>, RepositoryError> {
        let searches: BTreeMap<SearchKey, SearchParams> = records
            .iter()
            .flat_map(|record| {
                self.search_params(record)
                    .into_iter()
                    .map(|params| (SearchKey::new(record.id.clone(), &params), params))
            })
            .collect();

        let found = if searches.is_empty() {
            BTreeMap::new()
        } else {
            self.layer2
                .query_batch(&RawCatalog::ALL, &searches, self.candidate_limit, 0)?
        };
        debug!(
            records = records.len(),
            searches = searches.len(),
            hits = found.len(),
            "queried reference catalog"
        );

        // Candidates per record, deduplicated by pgc across dimensions.
        let mut candidates: BTreeMap<&str, BTreeMap<i64, Layer2Object>> = records
            .iter()
            .map(|record| (record.id.as_str(), BTreeMap::new()))
            .collect();
        for (key, objects) in found {
            let Some(entry) = candidates.get_mut(key.record_id.as_str()) else {
                continue;
            };
            for object in objects {
                entry.entry(object.pgc).or_insert(object);
            }
        }

        Ok(records
            .iter()
            .map(|record| {
                let found: Vec<Layer2Object> = candidates
                    .remove(record.id.as_str())
                    .map(|by_pgc| by_pgc.into_values().collect())
                    .unwrap_or_default();
                (record.id.clone(), self.classify(record, &found))
            })
            .collect())
    }

    /// Score each candidate and let the solver decide.
    pub fn classify(&self, record: &Record, candidates: &[Layer2Object]) -> CIResult {
        let scored: Vec<(Layer2Object, f64)> = candidates
            .iter()
            .map(|candidate| (candidate.clone(), self.matcher.score(record, candidate)))
            .collect();
        let result = self.solver.solve(&scored);
        trace!(record = %record.id, candidates = scored.len(), %result, "classified record");
        result
    }
}

impl std::fmt::Debug for CrossmatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossmatchEngine")
            .field("matcher", &self.matcher)
            .field("solver", &self.solver)
            .field("search_radius_arcsec", &self.search_radius_arcsec)
            .field("candidate_limit", &self.candidate_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogObject, DesignationObject, IcrsObject};
    use crate::config::CrossmatchConfig;
    use crate::plugin::{default_matcher_registry, default_solver_registry};
    use crate::repository::MemoryLayer2Repository;
    use parking_lot::Mutex;
    use serde_json::json;

    fn icrs(ra: f64, dec: f64) -> CatalogObject {
        CatalogObject::Icrs(IcrsObject::new(ra, dec, 0.0001, 0.0001).unwrap())
    }

    fn name(design: &str) -> CatalogObject {
        CatalogObject::Designation(DesignationObject::new(design).unwrap())
    }

    fn engine(objects: Vec<Layer2Object>) -> CrossmatchEngine {
        CrossmatchEngine::from_config(
            Arc::new(MemoryLayer2Repository::with_objects(objects)),
            &CrossmatchConfig::default(),
            &default_matcher_registry(),
            &default_solver_registry(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_when_nothing_nearby() {
        let engine = engine(vec![Layer2Object::new(1, vec![icrs(100.0, -30.0)])]);
        let records = vec![Record::new("r1", vec![icrs(10.0, 10.0)])];

        let results = engine.crossmatch(&records).unwrap();
        assert_eq!(results["r1"], CIResult::New);
    }

    #[test]
    fn test_existing_single_match() {
        let engine = engine(vec![
            Layer2Object::new(5, vec![icrs(10.0, 10.0), name("NGC 1")]),
            Layer2Object::new(6, vec![icrs(11.0, 10.0)]),
        ]);
        let records = vec![Record::new(
            "r1",
            vec![icrs(10.0, 10.0 + 1.0 / 3600.0), name("NGC1")],
        )];

        let results = engine.crossmatch(&records).unwrap();
        // Score is 1.0 * (1 - 1/3), which is neither below 0.1 nor above 0.9.
        assert_eq!(results["r1"], CIResult::collision([5]));

        let records = vec![Record::new("r2", vec![icrs(10.0, 10.0 + 1.0 / 3600.0)])];
        let results = engine.crossmatch(&records).unwrap();
        assert_eq!(results["r2"], CIResult::Existing { pgc: 5 });
    }

    #[test]
    fn test_collision_between_two_close_objects() {
        let engine = engine(vec![
            Layer2Object::new(1, vec![icrs(50.0, 0.0)]),
            Layer2Object::new(2, vec![icrs(50.0, 2.0 / 3600.0)]),
        ]);
        let records = vec![Record::new("r", vec![icrs(50.0, 1.0 / 3600.0)])];

        let results = engine.crossmatch(&records).unwrap();
        assert_eq!(results["r"], CIResult::collision([1, 2]));
    }

    #[test]
    fn test_candidates_deduplicated_across_dimensions() {
        let engine = engine(vec![Layer2Object::new(
            9,
            vec![icrs(20.0, 20.0), name("M33")],
        )]);
        let records = vec![Record::new("r", vec![icrs(20.0, 20.0), name("M33")])];

        let results = engine.crossmatch(&records).unwrap();
        assert_eq!(results["r"], CIResult::Existing { pgc: 9 });
    }

    #[test]
    fn test_alias_designation_is_existing() {
        let engine = engine(vec![Layer2Object::new(
            5818,
            vec![name("M33"), name("Triangulum"), icrs(23.4621, 30.6599)],
        )]);
        let records = vec![Record::new(
            "r",
            vec![name("Triangulum"), icrs(23.4621, 30.6599)],
        )];

        let results = engine.crossmatch(&records).unwrap();
        assert_eq!(results["r"], CIResult::Existing { pgc: 5818 });
    }

    #[test]
    fn test_positions_straddling_ra_zero() {
        let engine = engine(vec![Layer2Object::new(
            77,
            vec![icrs(359.9999, 0.0), icrs(0.0001, 0.0)],
        )]);
        let records = vec![Record::new("r", vec![icrs(0.0, 0.0)])];

        let results = engine.crossmatch(&records).unwrap();
        assert_eq!(results["r"], CIResult::Existing { pgc: 77 });
    }

    #[derive(Debug, Default)]
    struct CountingLayer2 {
        calls: Mutex<Vec<usize>>,
    }

    impl Layer2Repository for CountingLayer2 {
        fn query_batch(
            &self,
            _catalogs: &[RawCatalog],
            searches: &BTreeMap<SearchKey, SearchParams>,
            _limit: usize,
            _offset: usize,
        ) -> Result<BTreeMap<SearchKey, Vec<Layer2Object>>, RepositoryError> {
            self.calls.lock().push(searches.len());
            Ok(BTreeMap::new())
        }
    }

    #[test]
    fn test_single_round_trip_per_batch() {
        let layer2 = Arc::new(CountingLayer2::default());
        let engine = CrossmatchEngine::new(
            layer2.clone(),
            MatcherSpec::Constant(0.0),
            SolverSpec::NewAllBelowThreshold { threshold: 0.5 },
        );
        let records: Vec<Record> = (0..20)
            .map(|i| Record::new(format!("r{:02}", i), vec![icrs(i as f64, 0.0), name("x")]))
            .collect();

        let results = engine.crossmatch(&records).unwrap();
        assert_eq!(results.len(), 20);
        assert_eq!(*layer2.calls.lock(), vec![40]);
    }

    #[test]
    fn test_invalid_tree_fails_before_matching() {
        let config = CrossmatchConfig::default().with_solver(json!({"type": "vote"}));
        let err = CrossmatchEngine::from_config(
            Arc::new(MemoryLayer2Repository::new()),
            &config,
            &default_matcher_registry(),
            &default_solver_registry(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownPluginType { .. }));
    }
}
