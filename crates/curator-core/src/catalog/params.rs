//! Constructor parameters for catalog objects.

use std::collections::BTreeMap;

use serde_json::Value;

use super::RawCatalog;
use crate::error::ConstructionError;
use crate::units::{ParseUnitError, Quantity, Unit};

/// A single materialised parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A number with the unit of the column (or constant) it came from.
    Quantity(Quantity),
    /// Free text.
    Text(String),
}

/// Parameter dictionary passed to a catalog object constructor.
pub type Params = BTreeMap<String, ParamValue>;

impl ParamValue {
    /// Materialise a raw cell using the unit declared by its column.
    ///
    /// Nulls and blank strings are absent values.
    pub fn from_cell(value: &Value, unit: Unit) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => n
                .as_f64()
                .map(|v| ParamValue::Quantity(Quantity::new(v, unit))),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                if unit != Unit::Dimensionless {
                    if let Ok(v) = trimmed.parse::<f64>() {
                        return Some(ParamValue::Quantity(Quantity::new(v, unit)));
                    }
                }
                Some(ParamValue::Text(s.clone()))
            }
            Value::Bool(b) => Some(ParamValue::Text(b.to_string())),
            other => Some(ParamValue::Text(other.to_string())),
        }
    }

    /// Materialise a constant from homogenization params.
    ///
    /// Accepts either a plain JSON scalar or `{"value": .., "unit": ".."}`.
    pub fn from_constant(value: &Value) -> Result<Option<Self>, ParseUnitError> {
        if let Value::Object(map) = value {
            if let Some(inner) = map.get("value") {
                let unit = match map.get("unit").and_then(Value::as_str) {
                    Some(unit) => unit.parse()?,
                    None => Unit::Dimensionless,
                };
                return Ok(Self::from_cell(inner, unit));
            }
        }
        Ok(Self::from_cell(value, Unit::Dimensionless))
    }
}

/// Typed access to a parameter dictionary on behalf of one catalog family.
pub(crate) struct ParamReader<'a> {
    catalog: RawCatalog,
    params: &'a Params,
}

impl<'a> ParamReader<'a> {
    pub(crate) fn new(catalog: RawCatalog, params: &'a Params) -> Self {
        Self { catalog, params }
    }

    /// Read a finite number expressed in `target`, if present.
    pub(crate) fn quantity(&self, name: &str, target: Unit) -> Result<Option<f64>, ConstructionError> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };

        let converted = match value {
            ParamValue::Quantity(q) => {
                q.to(target)
                    .ok_or_else(|| ConstructionError::IncompatibleUnit {
                        catalog: self.catalog,
                        parameter: name.to_string(),
                        unit: q.unit.to_string(),
                    })?
            }
            ParamValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.invalid(name, format!("'{}' is not a number", s)))?,
        };

        if !converted.is_finite() {
            return Err(self.invalid(name, "value is not finite"));
        }
        Ok(Some(converted))
    }

    pub(crate) fn require_quantity(&self, name: &str, target: Unit) -> Result<f64, ConstructionError> {
        self.quantity(name, target)?
            .ok_or_else(|| self.missing(name))
    }

    /// Read a parameter as text. Numbers are rendered without a trailing `.0`.
    pub(crate) fn text(&self, name: &str) -> Option<String> {
        match self.params.get(name)? {
            ParamValue::Text(s) => Some(s.clone()),
            ParamValue::Quantity(q) => Some(format_number(q.value)),
        }
    }

    pub(crate) fn missing(&self, name: &str) -> ConstructionError {
        ConstructionError::MissingParameter {
            catalog: self.catalog,
            parameter: name.to_string(),
        }
    }

    pub(crate) fn invalid(&self, name: &str, reason: impl Into<String>) -> ConstructionError {
        ConstructionError::InvalidValue {
            catalog: self.catalog,
            parameter: name.to_string(),
            reason: reason.into(),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_cell() {
        assert_eq!(ParamValue::from_cell(&Value::Null, Unit::Degree), None);
        assert_eq!(ParamValue::from_cell(&json!("  "), Unit::Degree), None);
        assert_eq!(
            ParamValue::from_cell(&json!(1.5), Unit::Degree),
            Some(ParamValue::Quantity(Quantity::new(1.5, Unit::Degree)))
        );
        assert_eq!(
            ParamValue::from_cell(&json!("2.5"), Unit::Arcsecond),
            Some(ParamValue::Quantity(Quantity::new(2.5, Unit::Arcsecond)))
        );
        assert_eq!(
            ParamValue::from_cell(&json!("M 33"), Unit::Dimensionless),
            Some(ParamValue::Text("M 33".to_string()))
        );
    }

    #[test]
    fn test_from_constant_with_unit() {
        let value = ParamValue::from_constant(&json!({"value": 0.1, "unit": "arcsec"})).unwrap();
        assert_eq!(
            value,
            Some(ParamValue::Quantity(Quantity::new(0.1, Unit::Arcsecond)))
        );
        assert!(ParamValue::from_constant(&json!({"value": 1, "unit": "parsec"})).is_err());
    }

    #[test]
    fn test_reader_rejects_nan() {
        let mut params = Params::new();
        params.insert("z".to_string(), ParamValue::Text("NaN".to_string()));
        let reader = ParamReader::new(RawCatalog::Redshift, &params);
        assert!(matches!(
            reader.quantity("z", Unit::Dimensionless),
            Err(ConstructionError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_reader_text_formats_integers() {
        let mut params = Params::new();
        params.insert(
            "design".to_string(),
            ParamValue::Quantity(Quantity::dimensionless(224.0)),
        );
        let reader = ParamReader::new(RawCatalog::Designation, &params);
        assert_eq!(reader.text("design"), Some("224".to_string()));
    }
}
