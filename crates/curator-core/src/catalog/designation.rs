//! Object designations (names).

use serde_json::{json, Map, Value};

use super::params::{ParamReader, Params};
use super::RawCatalog;
use crate::error::ConstructionError;

/// A designation such as `NGC 224` or `M33`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignationObject {
    pub design: String,
}

impl DesignationObject {
    /// Create a designation. Surrounding whitespace is trimmed; empty is rejected.
    pub fn new(design: impl AsRef<str>) -> Result<Self, ConstructionError> {
        let design = design.as_ref().trim();
        if design.is_empty() {
            return Err(ConstructionError::InvalidValue {
                catalog: RawCatalog::Designation,
                parameter: "design".to_string(),
                reason: "designation is empty".to_string(),
            });
        }
        Ok(Self {
            design: design.to_string(),
        })
    }

    pub fn from_params(params: &Params) -> Result<Self, ConstructionError> {
        let reader = ParamReader::new(RawCatalog::Designation, params);
        let design = reader.text("design").ok_or_else(|| reader.missing("design"))?;
        Self::new(design)
    }

    /// Majority vote over designations.
    ///
    /// Ties go to the designation that was seen first among the tied ones.
    pub fn aggregate(objects: &[DesignationObject]) -> Option<DesignationObject> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for obj in objects {
            match counts.iter_mut().find(|(design, _)| *design == obj.design) {
                Some((_, count)) => *count += 1,
                None => counts.push((obj.design.as_str(), 1)),
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (design, count) in counts {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((design, count));
            }
        }

        best.map(|(design, _)| DesignationObject {
            design: design.to_string(),
        })
    }

    pub(crate) fn layer0_data(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("design".to_string(), json!(self.design));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<DesignationObject> {
        values
            .iter()
            .map(|v| DesignationObject::new(v).unwrap())
            .collect()
    }

    #[test]
    fn test_trims_and_rejects_empty() {
        assert_eq!(DesignationObject::new("  M33 ").unwrap().design, "M33");
        assert!(DesignationObject::new("   ").is_err());
    }

    #[test]
    fn test_missing_parameter() {
        let err = DesignationObject::from_params(&Params::new()).unwrap_err();
        assert!(matches!(err, ConstructionError::MissingParameter { .. }));
    }

    #[test]
    fn test_majority_wins_regardless_of_order() {
        let a = DesignationObject::aggregate(&names(&["M33", "NGC598", "M33"])).unwrap();
        let b = DesignationObject::aggregate(&names(&["NGC598", "M33", "M33"])).unwrap();
        assert_eq!(a.design, "M33");
        assert_eq!(b.design, "M33");
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let agg = DesignationObject::aggregate(&names(&["NGC598", "M33"])).unwrap();
        assert_eq!(agg.design, "NGC598");
        assert!(DesignationObject::aggregate(&[]).is_none());
    }
}
