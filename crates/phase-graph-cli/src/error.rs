//! CLI error type

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Graph(#[from] phase_graph::PhaseGraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Graph(phase_graph::PhaseGraphError::PhaseOutOfRange { .. })
            | CliError::Graph(phase_graph::PhaseGraphError::MissingDataModel) => 2,
            _ => 1,
        }
    }
}
