//! Command-line error types.

use thiserror::Error;

/// Errors surfaced by the `curator` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed fixture or configuration document.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid matcher, solver or rule configuration.
    #[error(transparent)]
    Configuration(#[from] curator_core::ConfigurationError),

    /// Failure while homogenizing or crossmatching.
    #[error(transparent)]
    Curation(#[from] curator_core::Error),

    /// Search expression rejected by the parser.
    #[error("{0}")]
    Parse(#[from] curator_lang::ParseError),

    /// Output serialization failed.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
