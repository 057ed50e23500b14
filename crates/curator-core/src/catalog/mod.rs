//! Catalog object model.
//!
//! A catalog object holds one family of physical quantities about an
//! astronomical object. The set of families is closed: every consumer
//! matches exhaustively on [`CatalogObject`].

mod designation;
mod icrs;
mod params;
mod pgc;
mod record;
mod redshift;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConstructionError;
use crate::units::Unit;

pub use designation::DesignationObject;
pub use icrs::IcrsObject;
pub use params::{ParamValue, Params};
pub use pgc::PgcObject;
pub use record::{CatalogView, Layer2Object, Record};
pub use redshift::RedshiftObject;

/// Physical-quantity family a catalog object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawCatalog {
    Icrs,
    Designation,
    Redshift,
    Pgc,
}

impl RawCatalog {
    /// Every family, in canonical order.
    pub const ALL: [RawCatalog; 4] = [
        RawCatalog::Icrs,
        RawCatalog::Designation,
        RawCatalog::Redshift,
        RawCatalog::Pgc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RawCatalog::Icrs => "icrs",
            RawCatalog::Designation => "designation",
            RawCatalog::Redshift => "redshift",
            RawCatalog::Pgc => "pgc",
        }
    }
}

impl fmt::Display for RawCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RawCatalog {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RawCatalog::ALL
            .into_iter()
            .find(|catalog| catalog.as_str() == s)
            .ok_or_else(|| format!("unknown catalog '{}'", s))
    }
}

/// One typed catalog object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredObject", into = "StoredObject")]
pub enum CatalogObject {
    Icrs(IcrsObject),
    Designation(DesignationObject),
    Redshift(RedshiftObject),
    Pgc(PgcObject),
}

impl CatalogObject {
    /// The family tag of this object.
    pub fn catalog(&self) -> RawCatalog {
        match self {
            CatalogObject::Icrs(_) => RawCatalog::Icrs,
            CatalogObject::Designation(_) => RawCatalog::Designation,
            CatalogObject::Redshift(_) => RawCatalog::Redshift,
            CatalogObject::Pgc(_) => RawCatalog::Pgc,
        }
    }

    /// Construct an object of the given family from materialised parameters.
    pub fn from_params(catalog: RawCatalog, params: &Params) -> Result<Self, ConstructionError> {
        Ok(match catalog {
            RawCatalog::Icrs => CatalogObject::Icrs(IcrsObject::from_params(params)?),
            RawCatalog::Designation => {
                CatalogObject::Designation(DesignationObject::from_params(params)?)
            }
            RawCatalog::Redshift => CatalogObject::Redshift(RedshiftObject::from_params(params)?),
            RawCatalog::Pgc => CatalogObject::Pgc(PgcObject::from_params(params)?),
        })
    }

    /// Reconstruct an object from its raw-layer column map, re-running validation.
    pub fn from_layer0(catalog: RawCatalog, data: &Map<String, Value>) -> Result<Self, ConstructionError> {
        let params: Params = data
            .iter()
            .filter_map(|(name, value)| {
                ParamValue::from_cell(value, Unit::Dimensionless).map(|v| (name.clone(), v))
            })
            .collect();
        Self::from_params(catalog, &params)
    }

    /// Raw-layer column map of this object.
    pub fn layer0_data(&self) -> Map<String, Value> {
        match self {
            CatalogObject::Icrs(o) => o.layer0_data(),
            CatalogObject::Designation(o) => o.layer0_data(),
            CatalogObject::Redshift(o) => o.layer0_data(),
            CatalogObject::Pgc(o) => o.layer0_data(),
        }
    }

    /// Name of the canonical (per-source) table this family is stored in.
    pub fn layer1_table(&self) -> &'static str {
        match self {
            CatalogObject::Icrs(_) => "icrs.data",
            CatalogObject::Designation(_) => "designation.data",
            CatalogObject::Redshift(_) => "cz.data",
            CatalogObject::Pgc(_) => "layer2.pgc",
        }
    }

    /// Combine several objects of one family into a canonical instance.
    ///
    /// Returns `Ok(None)` for an empty input and an error when families are mixed.
    pub fn aggregate(objects: &[CatalogObject]) -> Result<Option<CatalogObject>, ConstructionError> {
        let Some(first) = objects.first() else {
            return Ok(None);
        };
        let expected = first.catalog();
        if let Some(other) = objects.iter().find(|o| o.catalog() != expected) {
            return Err(ConstructionError::MixedAggregation {
                expected,
                found: other.catalog(),
            });
        }

        Ok(match expected {
            RawCatalog::Icrs => {
                let items: Vec<IcrsObject> = objects
                    .iter()
                    .filter_map(|o| match o {
                        CatalogObject::Icrs(x) => Some(x.clone()),
                        _ => None,
                    })
                    .collect();
                IcrsObject::aggregate(&items).map(CatalogObject::Icrs)
            }
            RawCatalog::Designation => {
                let items: Vec<DesignationObject> = objects
                    .iter()
                    .filter_map(|o| match o {
                        CatalogObject::Designation(x) => Some(x.clone()),
                        _ => None,
                    })
                    .collect();
                DesignationObject::aggregate(&items).map(CatalogObject::Designation)
            }
            RawCatalog::Redshift => {
                let items: Vec<RedshiftObject> = objects
                    .iter()
                    .filter_map(|o| match o {
                        CatalogObject::Redshift(x) => Some(x.clone()),
                        _ => None,
                    })
                    .collect();
                RedshiftObject::aggregate(&items).map(CatalogObject::Redshift)
            }
            RawCatalog::Pgc => {
                let items: Vec<PgcObject> = objects
                    .iter()
                    .filter_map(|o| match o {
                        CatalogObject::Pgc(x) => Some(*x),
                        _ => None,
                    })
                    .collect();
                PgcObject::aggregate(&items).map(CatalogObject::Pgc)
            }
        })
    }
}

/// Serialized form: the family tag next to the raw-layer columns.
#[derive(Serialize, Deserialize)]
struct StoredObject {
    catalog: RawCatalog,
    #[serde(flatten)]
    data: Map<String, Value>,
}

impl TryFrom<StoredObject> for CatalogObject {
    type Error = ConstructionError;

    fn try_from(stored: StoredObject) -> Result<Self, Self::Error> {
        CatalogObject::from_layer0(stored.catalog, &stored.data)
    }
}

impl From<CatalogObject> for StoredObject {
    fn from(object: CatalogObject) -> Self {
        StoredObject {
            catalog: object.catalog(),
            data: object.layer0_data(),
        }
    }
}
