//! Homogenization: mapping heterogeneous source columns onto catalog objects.

mod engine;
mod filter;
mod rule;

pub use engine::{get_homogenization, ColumnMapping, Homogenization, ObjectKey};
pub use filter::{parse_filters, ColumnFilter};
pub use rule::{HomogenizationParams, HomogenizationRule, RuleSpec};
