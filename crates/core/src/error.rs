//! Error types for chart and recipe operations.
//!
//! These errors never cross the public controller boundary. Controllers
//! log them and answer `false` or `None`; they exist so the transition
//! logic can use `?` and so the log line names the exact reason.

use bc_protocol::{ChartStatus, ExecutionStatus};
use thiserror::Error;

/// Reasons a chart or recipe operation did not happen.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    /// A business key (chart path, recipe name, equipment id) is malformed.
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// A recipe template or recipe data is missing required sections.
    #[error("Invalid recipe template: {0}")]
    InvalidTemplate(String),

    /// The chart is not in a status that permits the operation.
    #[error("Cannot {operation} chart in status {status:?}")]
    InvalidState {
        operation: &'static str,
        status: ChartStatus,
    },

    /// A record already exists for the key.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// No record exists for the key.
    #[error("{0} not found")]
    NotFound(String),

    /// A progress report would move progress backwards or is not a number.
    #[error("Invalid progress {reported} (current {current})")]
    InvalidProgress { reported: f64, current: f64 },

    /// The execution has already finished and cannot change.
    #[error("Execution is already {0}")]
    TerminalExecution(ExecutionStatus),
}

/// Type alias for Result with ControlError.
pub type ControlResult<T> = Result<T, ControlError>;
