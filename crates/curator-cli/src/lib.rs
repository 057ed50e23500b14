//! Curator command-line support: fixture loading and subcommands.

pub mod commands;
pub mod error;
pub mod fixture;

pub use commands::{render_query, run_fixture, search_fixture, QueryMatch, RunOptions, RunReport};
pub use error::{CliError, Result};
pub use fixture::{Fixture, Repositories};
