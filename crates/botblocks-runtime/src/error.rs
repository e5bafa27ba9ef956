//! Error types for the Botblocks runtime
//!
//! - Run admission failures
//! - Motion configuration loading and validation
//! - Session errors wrapping both of the above plus edit errors

use crate::interpreter::RunId;
use botblocks_program::EditError;
use std::path::PathBuf;

/// Interpreter errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// A run is already in flight; the new one is refused
    #[error("run already active: {0}")]
    RunAlreadyActive(RunId),

    /// `run` was called outside a tokio runtime
    #[error("no tokio runtime available to drive the run")]
    NoRuntime,

    /// The run task ended without producing a report
    #[error("run aborted: {0}")]
    Aborted(RunId),
}

/// Motion configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `MotionConfig`
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A speed is negative or not finite
    #[error("invalid {field}: {value}")]
    InvalidSpeed {
        /// Offending field name
        field: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Errors surfaced by a [`crate::Session`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Edit was rejected; live tree unchanged
    #[error(transparent)]
    Edit(#[from] EditError),

    /// Run was refused
    #[error(transparent)]
    Run(#[from] RunError),
}
