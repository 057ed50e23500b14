//! Equatorial (ICRS) positions.

use serde_json::{json, Map, Value};

use super::params::{ParamReader, Params};
use super::RawCatalog;
use crate::error::ConstructionError;
use crate::units::{angular_separation_arcsec, Unit};

/// Sky position with per-axis uncertainties. All angles in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct IcrsObject {
    pub ra: f64,
    pub dec: f64,
    pub e_ra: f64,
    pub e_dec: f64,
}

impl IcrsObject {
    /// Create a validated position. Right ascension is wrapped into [0, 360).
    pub fn new(ra: f64, dec: f64, e_ra: f64, e_dec: f64) -> Result<Self, ConstructionError> {
        let invalid = |parameter: &str, reason: &str| ConstructionError::InvalidValue {
            catalog: RawCatalog::Icrs,
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        };

        for (name, value) in [("ra", ra), ("dec", dec), ("e_ra", e_ra), ("e_dec", e_dec)] {
            if !value.is_finite() {
                return Err(invalid(name, "value is not finite"));
            }
        }
        if !(-90.0..=90.0).contains(&dec) {
            return Err(invalid("dec", "declination must lie in [-90, 90] degrees"));
        }
        if e_ra < 0.0 {
            return Err(invalid("e_ra", "uncertainty must not be negative"));
        }
        if e_dec < 0.0 {
            return Err(invalid("e_dec", "uncertainty must not be negative"));
        }

        // rem_euclid rounds tiny negative angles up to exactly 360.
        let ra = ra.rem_euclid(360.0);
        Ok(Self {
            ra: if ra >= 360.0 { 0.0 } else { ra },
            dec,
            e_ra,
            e_dec,
        })
    }

    /// Build from `ra`, `dec`, `e_ra`, `e_dec`. Every parameter is required.
    pub fn from_params(params: &Params) -> Result<Self, ConstructionError> {
        let reader = ParamReader::new(RawCatalog::Icrs, params);
        Self::new(
            reader.require_quantity("ra", Unit::Degree)?,
            reader.require_quantity("dec", Unit::Degree)?,
            reader.require_quantity("e_ra", Unit::Degree)?,
            reader.require_quantity("e_dec", Unit::Degree)?,
        )
    }

    /// Arithmetic mean of coordinates and of their uncertainties.
    pub fn aggregate(objects: &[IcrsObject]) -> Option<IcrsObject> {
        if objects.is_empty() {
            return None;
        }
        let n = objects.len() as f64;
        let mean = |f: fn(&IcrsObject) -> f64| objects.iter().map(f).sum::<f64>() / n;

        Some(IcrsObject {
            ra: mean(|o| o.ra),
            dec: mean(|o| o.dec),
            e_ra: mean(|o| o.e_ra),
            e_dec: mean(|o| o.e_dec),
        })
    }

    /// Separation from another position in arcseconds.
    pub fn separation_arcsec(&self, other: &IcrsObject) -> f64 {
        angular_separation_arcsec(self.ra, self.dec, other.ra, other.dec)
    }

    pub(crate) fn layer0_data(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("ra".to_string(), json!(self.ra));
        map.insert("dec".to_string(), json!(self.dec));
        map.insert("e_ra".to_string(), json!(self.e_ra));
        map.insert("e_dec".to_string(), json!(self.e_dec));
        map
    }
}
