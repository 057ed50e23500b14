//! Reference catalog storage (layer 2).

use std::collections::BTreeMap;

use crate::catalog::{Layer2Object, RawCatalog};
use crate::error::RepositoryError;

/// Identifies one search in a batched query: which record it serves and
/// along which dimension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchKey {
    pub record_id: String,
    pub dimension: &'static str,
}

impl SearchKey {
    pub fn new(record_id: impl Into<String>, params: &SearchParams) -> Self {
        Self {
            record_id: record_id.into(),
            dimension: params.name(),
        }
    }
}

/// One search dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchParams {
    /// Objects carrying this designation.
    Designation { design: String },
    /// Objects within a cone around a position, degrees in.
    Icrs { ra: f64, dec: f64, radius_arcsec: f64 },
}

impl SearchParams {
    pub fn name(&self) -> &'static str {
        match self {
            SearchParams::Designation { .. } => "designation",
            SearchParams::Icrs { .. } => "icrs",
        }
    }
}

/// Trait for reference catalog backends.
pub trait Layer2Repository: Send + Sync {
    /// Run every search in one round trip.
    ///
    /// Returned objects hold only the requested `catalogs`. `limit` and
    /// `offset` apply to each search separately. Searches without hits may
    /// be absent from the result.
    fn query_batch(
        &self,
        catalogs: &[RawCatalog],
        searches: &BTreeMap<SearchKey, SearchParams>,
        limit: usize,
        offset: usize,
    ) -> Result<BTreeMap<SearchKey, Vec<Layer2Object>>, RepositoryError>;
}
