//! Line-of-sight velocities.

use serde_json::{json, Map, Value};

use super::params::{ParamReader, Params};
use super::RawCatalog;
use crate::error::ConstructionError;
use crate::units::{Unit, SPEED_OF_LIGHT_KMS};

/// Recession velocity `cz` in km/s with an optional uncertainty.
#[derive(Debug, Clone, PartialEq)]
pub struct RedshiftObject {
    pub cz: f64,
    pub e_cz: Option<f64>,
}

impl RedshiftObject {
    pub fn new(cz: f64, e_cz: Option<f64>) -> Result<Self, ConstructionError> {
        let invalid = |parameter: &str, reason: &str| ConstructionError::InvalidValue {
            catalog: RawCatalog::Redshift,
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        };

        if !cz.is_finite() {
            return Err(invalid("cz", "value is not finite"));
        }
        if let Some(e_cz) = e_cz {
            if !e_cz.is_finite() {
                return Err(invalid("e_cz", "value is not finite"));
            }
            if e_cz < 0.0 {
                return Err(invalid("e_cz", "uncertainty must not be negative"));
            }
        }
        Ok(Self { cz, e_cz })
    }

    /// Build from `cz`/`e_cz`, falling back to `z`/`e_z` scaled by the speed of light.
    pub fn from_params(params: &Params) -> Result<Self, ConstructionError> {
        let reader = ParamReader::new(RawCatalog::Redshift, params);

        if let Some(cz) = reader.quantity("cz", Unit::KilometerPerSecond)? {
            let e_cz = reader.quantity("e_cz", Unit::KilometerPerSecond)?;
            return Self::new(cz, e_cz);
        }

        match reader.quantity("z", Unit::Dimensionless)? {
            Some(z) => {
                let e_z = reader.quantity("e_z", Unit::Dimensionless)?;
                Self::new(
                    z * SPEED_OF_LIGHT_KMS,
                    e_z.map(|e| e * SPEED_OF_LIGHT_KMS),
                )
            }
            None => Err(reader.missing("cz")),
        }
    }

    /// Mean velocity; the uncertainty is averaged over objects that have one.
    pub fn aggregate(objects: &[RedshiftObject]) -> Option<RedshiftObject> {
        if objects.is_empty() {
            return None;
        }
        let cz = objects.iter().map(|o| o.cz).sum::<f64>() / objects.len() as f64;

        let errors: Vec<f64> = objects.iter().filter_map(|o| o.e_cz).collect();
        let e_cz = if errors.is_empty() {
            None
        } else {
            Some(errors.iter().sum::<f64>() / errors.len() as f64)
        };

        Some(RedshiftObject { cz, e_cz })
    }

    pub(crate) fn layer0_data(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("cz".to_string(), json!(self.cz));
        if let Some(e_cz) = self.e_cz {
            map.insert("e_cz".to_string(), json!(e_cz));
        }
        map
    }
}
