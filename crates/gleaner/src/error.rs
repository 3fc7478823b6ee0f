//! Error types for the gleaner library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gleaner operations.
#[derive(Debug, Error)]
pub enum GleanerError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed record in a line-oriented input file.
    #[error("Parse error in '{path}' at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rule configuration is structurally invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Split ratios cannot produce a partition.
    #[error("Invalid split ratios: {0}")]
    InvalidRatios(String),

    /// A manual override could not be accepted.
    #[error("Invalid override for {reference}: {message}")]
    InvalidOverride { reference: String, message: String },

    /// A label that the rule set does not define (strict mode only).
    #[error("Unknown label '{label}' in {context}")]
    UnknownLabel { label: String, context: String },

    /// An example violated a span invariant after processing.
    #[error("Span invariant violated in {example}: {message}")]
    Invariant { example: String, message: String },
}

impl GleanerError {
    /// Wrap an IO error together with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GleanerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for gleaner operations.
pub type Result<T> = std::result::Result<T, GleanerError>;
