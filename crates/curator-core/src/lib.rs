//! Curator Core - homogenization and cross-identification of astronomical
//! catalog uploads.
//!
//! Raw tables are mapped onto typed catalog objects by priority-ordered
//! homogenization rules, then every resulting record is classified against
//! the reference catalog as new, an existing object, or a collision that
//! needs arbitration.

pub mod catalog;
pub mod config;
pub mod crossmatch;
pub mod errgroup;
pub mod error;
pub mod homogenization;
pub mod plugin;
pub mod repository;
pub mod table;
pub mod units;

pub use catalog::{
    CatalogObject, CatalogView, DesignationObject, IcrsObject, Layer2Object, PgcObject,
    RawCatalog, Record, RedshiftObject,
};
pub use config::{CrossmatchConfig, CurationConfig, HomogenizationConfig};
pub use crossmatch::{
    BatchProgress, CIResult, CrossmatchEngine, CrossmatchTask, CursorRange, OutcomeCounts,
    StopSignal, TaskOutcome,
};
pub use errgroup::ErrorGroup;
pub use error::{ConfigurationError, ConstructionError, ConversionError, Error, RepositoryError, Result};
pub use homogenization::{
    get_homogenization, Homogenization, HomogenizationParams, HomogenizationRule, RuleSpec,
};
pub use plugin::{
    default_matcher_registry, default_solver_registry, Matcher, MatcherSpec, PluginRegistry,
    Solver, SolverSpec,
};
pub use repository::{
    Layer0Repository, Layer2Repository, MemoryLayer0Repository, MemoryLayer2Repository,
    SearchKey, SearchParams,
};
pub use table::{ColumnDescription, DataType, RawRow, TableMeta, TableStatistics};
pub use units::{Quantity, Unit};
