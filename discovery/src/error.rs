//! Error types for script inspection.
//!
//! The extractors themselves never fail: malformed manifests and
//! unrenderable signatures degrade to fallback values. Errors only arise
//! around them, when reading files, loading configuration, or setting up
//! the Python grammar.

use thiserror::Error;

/// Errors that can occur while inspecting scripts.
#[derive(Debug, Error)]
pub enum InspectError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The Python grammar could not be loaded into the parser.
    #[error("failed to load Python grammar: {0}")]
    Grammar(String),

    /// The parser produced no syntax tree.
    #[error("failed to build syntax tree: {0}")]
    SyntaxTree(String),

    /// A command-line or API input was unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results with [`InspectError`].
pub type Result<T> = std::result::Result<T, InspectError>;
