//! Physical units, quantities, and sky geometry.
//!
//! Only the handful of units that appear in submitted catalog columns are
//! supported. Angles are normalised to degrees and velocities to km/s.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Speed of light in km/s.
pub const SPEED_OF_LIGHT_KMS: f64 = 299_792.458;

/// Arcseconds per degree.
pub const ARCSEC_PER_DEGREE: f64 = 3600.0;

/// Physical kind of a unit. Conversion is only possible within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Angle,
    Velocity,
    Dimensionless,
}

/// A unit attached to a column or a constant parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    Degree,
    Radian,
    Arcminute,
    Arcsecond,
    Milliarcsecond,
    /// Hours of right ascension (15 degrees each).
    HourAngle,
    KilometerPerSecond,
    MeterPerSecond,
    /// No unit declared: the value is taken to be in the target unit.
    #[default]
    Dimensionless,
}

impl Unit {
    /// The physical kind of this unit.
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Degree
            | Unit::Radian
            | Unit::Arcminute
            | Unit::Arcsecond
            | Unit::Milliarcsecond
            | Unit::HourAngle => UnitKind::Angle,
            Unit::KilometerPerSecond | Unit::MeterPerSecond => UnitKind::Velocity,
            Unit::Dimensionless => UnitKind::Dimensionless,
        }
    }

    /// Multiplier taking a value in this unit to the base unit of its kind.
    fn scale(&self) -> f64 {
        match self {
            Unit::Degree => 1.0,
            Unit::Radian => 180.0 / std::f64::consts::PI,
            Unit::Arcminute => 1.0 / 60.0,
            Unit::Arcsecond => 1.0 / ARCSEC_PER_DEGREE,
            Unit::Milliarcsecond => 1.0 / (ARCSEC_PER_DEGREE * 1000.0),
            Unit::HourAngle => 15.0,
            Unit::KilometerPerSecond => 1.0,
            Unit::MeterPerSecond => 1.0e-3,
            Unit::Dimensionless => 1.0,
        }
    }

    /// Canonical symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Degree => "deg",
            Unit::Radian => "rad",
            Unit::Arcminute => "arcmin",
            Unit::Arcsecond => "arcsec",
            Unit::Milliarcsecond => "mas",
            Unit::HourAngle => "h",
            Unit::KilometerPerSecond => "km/s",
            Unit::MeterPerSecond => "m/s",
            Unit::Dimensionless => "",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Dimensionless => write!(f, "dimensionless"),
            other => write!(f, "{}", other.symbol()),
        }
    }
}

/// Unit string that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown unit '{0}'")]
pub struct ParseUnitError(pub String);

impl FromStr for Unit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let unit = match normalized.as_str() {
            "" => Unit::Dimensionless,
            "deg" | "degree" | "degrees" => Unit::Degree,
            "rad" | "radian" | "radians" => Unit::Radian,
            "arcmin" | "amin" => Unit::Arcminute,
            "arcsec" | "asec" => Unit::Arcsecond,
            "mas" => Unit::Milliarcsecond,
            "h" | "hour" | "hourangle" => Unit::HourAngle,
            "km/s" | "km s-1" | "km.s-1" => Unit::KilometerPerSecond,
            "m/s" | "m s-1" | "m.s-1" => Unit::MeterPerSecond,
            _ => return Err(ParseUnitError(s.to_string())),
        };
        Ok(unit)
    }
}

/// A numeric value tagged with its unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    /// Create a quantity.
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// A bare number without a unit.
    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Unit::Dimensionless)
    }

    /// Express this quantity in `target`.
    ///
    /// Returns `None` when the kinds differ. A dimensionless quantity is
    /// assumed to already be in `target`.
    pub fn to(&self, target: Unit) -> Option<f64> {
        if self.unit == Unit::Dimensionless {
            return Some(self.value);
        }
        if self.unit.kind() != target.kind() {
            return None;
        }
        Some(self.value * self.unit.scale() / target.scale())
    }
}

/// Great-circle separation between two equatorial positions.
///
/// Inputs are degrees; the result is in arcseconds.
pub fn angular_separation_arcsec(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let (ra1, dec1, ra2, dec2) = (
        ra1.to_radians(),
        dec1.to_radians(),
        ra2.to_radians(),
        dec2.to_radians(),
    );
    let half_ddec = (dec2 - dec1) / 2.0;
    let half_dra = (ra2 - ra1) / 2.0;
    let h = half_ddec.sin().powi(2) + dec1.cos() * dec2.cos() * half_dra.sin().powi(2);
    let separation = 2.0 * h.sqrt().min(1.0).asin();
    separation.to_degrees() * ARCSEC_PER_DEGREE
}
