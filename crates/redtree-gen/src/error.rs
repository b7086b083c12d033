//! Error types for tree construction

use redtree_ir::ValidationError;
use thiserror::Error;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors that can occur while building a stage or tree
#[derive(Debug, Error)]
pub enum TreeError {
    /// Fan-in, stage count or width outside what the tree can be built from
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Operation name outside the supported variant set
    #[error("Unknown operation: '{0}'")]
    UnknownOperation(String),

    /// TOML parsing error
    #[error("Failed to parse tree configuration: {0}")]
    Config(String),

    /// I/O error reading a configuration file
    #[error("I/O error: {0}")]
    Io(String),

    /// Elaborated design failed structural validation
    #[error("Malformed design: {0}")]
    Validation(#[from] ValidationError),
}
