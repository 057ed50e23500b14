//! Records awaiting cross-identification and reference catalog entries.

use serde::{Deserialize, Serialize};

use super::{
    CatalogObject, DesignationObject, IcrsObject, RawCatalog, RedshiftObject,
};

/// One homogenized row of a raw upload (layer 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub data: Vec<CatalogObject>,
}

impl Record {
    pub fn new(id: impl Into<String>, data: Vec<CatalogObject>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// First object of the given family, if any.
    pub fn get(&self, catalog: RawCatalog) -> Option<&CatalogObject> {
        self.data.iter().find(|o| o.catalog() == catalog)
    }
}

/// A deduplicated reference catalog entry (layer 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer2Object {
    pub pgc: i64,
    pub data: Vec<CatalogObject>,
}

impl Layer2Object {
    pub fn new(pgc: i64, data: Vec<CatalogObject>) -> Self {
        Self { pgc, data }
    }

    /// Canonical value of one family, aggregated over every object held.
    pub fn aggregated(&self, catalog: RawCatalog) -> Option<CatalogObject> {
        let objects: Vec<CatalogObject> = self
            .data
            .iter()
            .filter(|o| o.catalog() == catalog)
            .cloned()
            .collect();
        CatalogObject::aggregate(&objects).ok().flatten()
    }

    /// Copy of this entry holding only the requested families.
    pub fn restricted_to(&self, catalogs: &[RawCatalog]) -> Layer2Object {
        Layer2Object {
            pgc: self.pgc,
            data: self
                .data
                .iter()
                .filter(|o| catalogs.contains(&o.catalog()))
                .cloned()
                .collect(),
        }
    }
}

/// Typed read access shared by records and reference entries.
///
/// Matchers score a record against a candidate through this trait so both
/// sides are looked up the same way.
pub trait CatalogView {
    /// The object of the given family this view exposes, if any.
    fn object(&self, catalog: RawCatalog) -> Option<CatalogObject>;

    /// Every stored object of the given family, without aggregation.
    fn objects_of(&self, catalog: RawCatalog) -> Vec<CatalogObject>;

    /// Every designation held, in stored order.
    fn designations(&self) -> Vec<DesignationObject> {
        self.objects_of(RawCatalog::Designation)
            .into_iter()
            .filter_map(|o| match o {
                CatalogObject::Designation(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    /// Every stored position, in stored order.
    fn positions(&self) -> Vec<IcrsObject> {
        self.objects_of(RawCatalog::Icrs)
            .into_iter()
            .filter_map(|o| match o {
                CatalogObject::Icrs(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Smallest separation between `position` and any stored position.
    fn closest_separation_arcsec(&self, position: &IcrsObject) -> Option<f64> {
        self.positions()
            .iter()
            .map(|p| p.separation_arcsec(position))
            .min_by(f64::total_cmp)
    }

    fn icrs(&self) -> Option<IcrsObject> {
        match self.object(RawCatalog::Icrs)? {
            CatalogObject::Icrs(o) => Some(o),
            _ => None,
        }
    }

    fn designation(&self) -> Option<DesignationObject> {
        match self.object(RawCatalog::Designation)? {
            CatalogObject::Designation(o) => Some(o),
            _ => None,
        }
    }

    fn redshift(&self) -> Option<RedshiftObject> {
        match self.object(RawCatalog::Redshift)? {
            CatalogObject::Redshift(o) => Some(o),
            _ => None,
        }
    }
}

fn of_family(data: &[CatalogObject], catalog: RawCatalog) -> Vec<CatalogObject> {
    data.iter().filter(|o| o.catalog() == catalog).cloned().collect()
}

impl CatalogView for Record {
    fn object(&self, catalog: RawCatalog) -> Option<CatalogObject> {
        self.get(catalog).cloned()
    }

    fn objects_of(&self, catalog: RawCatalog) -> Vec<CatalogObject> {
        of_family(&self.data, catalog)
    }
}

impl CatalogView for Layer2Object {
    fn object(&self, catalog: RawCatalog) -> Option<CatalogObject> {
        self.aggregated(catalog)
    }

    fn objects_of(&self, catalog: RawCatalog) -> Vec<CatalogObject> {
        of_family(&self.data, catalog)
    }
}
