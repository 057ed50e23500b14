//! Curation pipeline configuration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default number of raw rows per crossmatch batch.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default cone radius for positional candidate searches.
pub const DEFAULT_SEARCH_RADIUS_ARCSEC: f64 = 10.0;

/// Default cap on candidates returned per search.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 100;

/// Matcher tree used when none is configured.
pub fn default_matcher_config() -> Value {
    json!({
        "type": "and",
        "matcher1": {"type": "circle", "radius_arcsec": 10},
        "matcher2": {
            "type": "ignore_no_name",
            "matcher": {"type": "levenshtein", "max_distance": 3}
        }
    })
}

/// Solver tree used when none is configured.
pub fn default_solver_config() -> Value {
    json!({
        "type": "or",
        "solver1": {"type": "new_all_below_threshold", "threshold": 0.1},
        "solver2": {"type": "existing_only_one_above_threshold", "threshold": 0.9}
    })
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    pub homogenization: HomogenizationConfig,
    pub crossmatch: CrossmatchConfig,
}

impl CurationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a JSON document. Missing sections take their defaults.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Escalate per-row construction failures instead of skipping them.
    pub fn strict(mut self) -> Self {
        self.homogenization.ignore_errors = false;
        self
    }

    pub fn with_crossmatch(mut self, crossmatch: CrossmatchConfig) -> Self {
        self.crossmatch = crossmatch;
        self
    }
}

/// Homogenization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomogenizationConfig {
    /// Skip and log rows whose values fail validation.
    pub ignore_errors: bool,
}

impl Default for HomogenizationConfig {
    fn default() -> Self {
        Self {
            ignore_errors: true,
        }
    }
}

/// Crossmatch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossmatchConfig {
    /// Raw rows per batch.
    pub batch_size: usize,

    /// Cone radius of the positional search dimension.
    pub search_radius_arcsec: f64,

    /// Maximum candidates requested per search.
    pub candidate_limit: usize,

    /// Matcher plugin tree.
    pub matcher: Value,

    /// Solver plugin tree.
    pub solver: Value,
}

impl Default for CrossmatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            search_radius_arcsec: DEFAULT_SEARCH_RADIUS_ARCSEC,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            matcher: default_matcher_config(),
            solver: default_solver_config(),
        }
    }
}

impl CrossmatchConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_search_radius(mut self, radius_arcsec: f64) -> Self {
        self.search_radius_arcsec = radius_arcsec;
        self
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    pub fn with_matcher(mut self, matcher: Value) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_solver(mut self, solver: Value) -> Self {
        self.solver = solver;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CurationConfig::default();
        assert!(config.homogenization.ignore_errors);
        assert_eq!(config.crossmatch.batch_size, 500);
        assert_eq!(config.crossmatch.search_radius_arcsec, 10.0);
        assert_eq!(config.crossmatch.matcher["type"], "and");
        assert_eq!(config.crossmatch.solver["type"], "or");
    }

    #[test]
    fn test_partial_document() {
        let config =
            CurationConfig::from_json(r#"{"crossmatch": {"batch_size": 50}}"#).unwrap();
        assert_eq!(config.crossmatch.batch_size, 50);
        assert_eq!(config.crossmatch.candidate_limit, DEFAULT_CANDIDATE_LIMIT);
        assert!(config.homogenization.ignore_errors);
    }

    #[test]
    fn test_builders() {
        let config = CurationConfig::new()
            .strict()
            .with_crossmatch(CrossmatchConfig::default().with_batch_size(10));
        assert!(!config.homogenization.ignore_errors);
        assert_eq!(config.crossmatch.batch_size, 10);
    }
}
