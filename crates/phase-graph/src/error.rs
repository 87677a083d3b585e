//! Error types for the phase graph

use thiserror::Error;

/// Result type alias using PhaseGraphError
pub type Result<T> = std::result::Result<T, PhaseGraphError>;

/// Errors that abort a dump
///
/// Configuration anomalies (duplicate units, null entries, pruned units)
/// are not errors; they are reported through the diagnostic sink and the
/// export summary instead.
#[derive(Debug, Error)]
pub enum PhaseGraphError {
    /// Requested phase index is not in the configured phase list
    #[error("Phase {phase} is out of range ({available} phases configured)")]
    PhaseOutOfRange { phase: usize, available: usize },

    /// Runtime mode was requested without a live data model
    #[error("Runtime analysis requires a live data model")]
    MissingDataModel,

    /// A dumped document could not be interpreted
    #[error("Invalid graph document: {0}")]
    InvalidDocument(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PhaseGraphError {
    /// Create an invalid document error with a message
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }
}
