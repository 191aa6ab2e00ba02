//! Error types for relconv.

use thiserror::Error;

/// Result type alias for relconv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in relconv operations.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("invalid layer configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown activation function: {0}")]
    UnknownActivation(String),

    #[error("unknown initialization distribution: {0}")]
    UnknownInit(String),

    // Forward-pass errors
    #[error("feature vector for node {node} has length {found}, expected {expected}")]
    ShapeMismatch {
        node: String,
        expected: usize,
        found: usize,
    },

    #[error("relation index {relation} out of range for layer with {num_relations} relations")]
    RelationOutOfRange {
        relation: usize,
        num_relations: usize,
    },

    #[error("no feature vector for node {0}")]
    MissingFeatures(String),

    // Serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
