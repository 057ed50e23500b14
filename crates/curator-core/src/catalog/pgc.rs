//! Permanent global identifiers.

use serde_json::{json, Map, Value};

use super::params::{ParamReader, Params};
use super::RawCatalog;
use crate::error::ConstructionError;
use crate::units::Unit;

/// A PGC number already assigned to the object by some source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgcObject {
    pub pgc: i64,
}

impl PgcObject {
    pub fn new(pgc: i64) -> Result<Self, ConstructionError> {
        if pgc <= 0 {
            return Err(ConstructionError::InvalidValue {
                catalog: RawCatalog::Pgc,
                parameter: "pgc".to_string(),
                reason: format!("identifier must be positive, got {}", pgc),
            });
        }
        Ok(Self { pgc })
    }

    pub fn from_params(params: &Params) -> Result<Self, ConstructionError> {
        let reader = ParamReader::new(RawCatalog::Pgc, params);
        let value = reader.require_quantity("pgc", Unit::Dimensionless)?;
        if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return Err(reader.invalid("pgc", format!("{} is not an integer identifier", value)));
        }
        Self::new(value as i64)
    }

    /// Identity: the first identifier wins.
    pub fn aggregate(objects: &[PgcObject]) -> Option<PgcObject> {
        objects.first().copied()
    }

    pub(crate) fn layer0_data(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("pgc".to_string(), json!(self.pgc));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ParamValue;

    #[test]
    fn test_from_text() {
        let mut params = Params::new();
        params.insert("pgc".to_string(), ParamValue::Text("2557".to_string()));
        assert_eq!(PgcObject::from_params(&params).unwrap().pgc, 2557);
    }

    #[test]
    fn test_rejects_fractional_and_negative() {
        let mut params = Params::new();
        params.insert("pgc".to_string(), ParamValue::Text("12.5".to_string()));
        assert!(PgcObject::from_params(&params).is_err());
        assert!(PgcObject::new(-3).is_err());
    }

    #[test]
    fn test_aggregate_takes_first() {
        let objs = [PgcObject::new(7).unwrap(), PgcObject::new(9).unwrap()];
        assert_eq!(PgcObject::aggregate(&objs).unwrap().pgc, 7);
    }
}
