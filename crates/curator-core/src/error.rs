//! Core error types.

use crate::catalog::RawCatalog;
use thiserror::Error;

/// Invalid declarative configuration: filters, plugin trees, arguments.
///
/// Always fatal and raised while building, before any row is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A column filter key that no built-in filter understands.
    #[error("unknown column filter '{key}'")]
    UnknownFilter {
        /// The offending filter key.
        key: String,
    },

    /// A plugin `type` that is not present in the registry.
    #[error("unknown {kind} type '{name}'")]
    UnknownPluginType {
        /// Registry kind ("matcher" or "solver").
        kind: String,
        /// The requested type name.
        name: String,
    },

    /// A plugin configuration without a string `type` field.
    #[error("plugin configuration is missing a 'type' field")]
    MissingType,

    /// A plugin configuration that is not a JSON object.
    #[error("plugin configuration must be an object, got {0}")]
    NotAnObject(String),

    /// A required constructor argument was not supplied.
    #[error("{plugin}: missing required argument '{argument}'")]
    MissingArgument {
        /// Plugin type name.
        plugin: String,
        /// Argument name.
        argument: String,
    },

    /// A constructor argument has the wrong shape or an out-of-range value.
    #[error("{plugin}: invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// Plugin type name.
        plugin: String,
        /// Argument name.
        argument: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A constructor argument the plugin does not accept.
    #[error("{plugin}: unexpected argument '{argument}'")]
    UnexpectedArgument {
        /// Plugin type name.
        plugin: String,
        /// Argument name.
        argument: String,
    },
}

/// Failure to map a table's columns onto catalog parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Not a single column satisfied any homogenization rule.
    #[error("no column of table '{table}' matches any homogenization rule")]
    NoColumnsMatched {
        /// Table name.
        table: String,
    },

    /// A mapped column declares a unit that cannot be interpreted.
    #[error("column '{column}' has unknown unit '{unit}'")]
    UnknownUnit {
        /// Column name.
        column: String,
        /// The raw unit string.
        unit: String,
    },
}

/// A single row's values fail a catalog object's validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    /// A required parameter is absent.
    #[error("{catalog}: missing required parameter '{parameter}'")]
    MissingParameter {
        /// Target catalog family.
        catalog: RawCatalog,
        /// Parameter name.
        parameter: String,
    },

    /// A parameter is present but its value is unusable.
    #[error("{catalog}: invalid value for '{parameter}': {reason}")]
    InvalidValue {
        /// Target catalog family.
        catalog: RawCatalog,
        /// Parameter name.
        parameter: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A quantity carries a unit of the wrong physical kind.
    #[error("{catalog}: parameter '{parameter}' cannot be expressed in {unit}")]
    IncompatibleUnit {
        /// Target catalog family.
        catalog: RawCatalog,
        /// Parameter name.
        parameter: String,
        /// The unit that was supplied.
        unit: String,
    },

    /// Aggregation over objects of different catalog families.
    #[error("cannot aggregate {found} object into {expected}")]
    MixedAggregation {
        /// Family of the first object.
        expected: RawCatalog,
        /// Family of the offending object.
        found: RawCatalog,
    },
}

/// Errors surfaced by repository collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    /// The requested table does not exist.
    #[error("table {0} not found")]
    TableNotFound(i64),

    /// Backend-specific failure.
    #[error("repository error: {0}")]
    Backend(String),
}

/// Top-level error for the curation pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Conversion error.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Construction error escalated by a strict homogenization.
    #[error("construction error: {0}")]
    Construction(#[from] ConstructionError),

    /// Repository error.
    #[error("{0}")]
    Repository(#[from] RepositoryError),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
