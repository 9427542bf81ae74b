//! Recipe execution models.
//!
//! A recipe execution is one run of a stored recipe against a piece of
//! equipment, producing one batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Status of a recipe execution.
///
/// Transitions are monotonic: Running -> Completed | Aborted | Failed.
/// A finished execution is never resurrected.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Execution is in progress.
    Running,

    /// All steps finished.
    Completed,

    /// Stopped on operator request.
    Aborted,

    /// Stopped because of an error reported by the step executor.
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        self == ExecutionStatus::Running && next.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Aborted => "aborted",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step an execution has passed through.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExecutionStepEntry {
    pub step: String,

    pub entered_at: DateTime<Utc>,

    /// Progress reported when the step was entered.
    pub progress_percent: f64,
}

/// Runtime state of a single recipe execution.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeExecutionRecord {
    pub execution_id: Uuid,

    pub recipe_id: String,

    pub recipe_name: String,

    pub recipe_version: String,

    pub equipment_id: String,

    /// Batch identifier, generated as `BATCH_<timestamp>` when omitted.
    pub batch_id: String,

    pub status: ExecutionStatus,

    pub start_time: DateTime<Utc>,

    pub end_time: Option<DateTime<Utc>>,

    /// Minutes between start and end, set once the execution finishes.
    pub duration_minutes: Option<f64>,

    pub progress_percent: f64,

    pub current_step: String,

    pub execution_parameters: HashMap<String, serde_json::Value>,

    /// Steps entered so far, oldest first. Includes the first step.
    pub step_history: Vec<ExecutionStepEntry>,

    pub abort_reason: Option<String>,

    /// Whether the abort was requested as a safe abort.
    pub safe_abort: Option<bool>,

    /// Failure description reported by the step executor.
    pub error: Option<String>,
}

/// Answer to an execution status query.
///
/// `Summary` is the reduced projection meant for cheap polling; `Detailed`
/// carries the full record and computed timing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ExecutionStatusView {
    // Listed first so untagged decoding does not match a detailed view as
    // a summary.
    Detailed {
        #[serde(flatten)]
        record: Box<RecipeExecutionRecord>,
        /// Minutes since start, only while running.
        runtime_minutes: Option<f64>,
        /// Provided by the configured completion estimator, if any.
        estimated_completion: Option<DateTime<Utc>>,
    },
    Summary {
        execution_id: Uuid,
        status: ExecutionStatus,
        progress_percent: f64,
        current_step: String,
    },
}

impl ExecutionStatusView {
    pub fn execution_id(&self) -> Uuid {
        match self {
            ExecutionStatusView::Summary { execution_id, .. } => *execution_id,
            ExecutionStatusView::Detailed { record, .. } => record.execution_id,
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        match self {
            ExecutionStatusView::Summary { status, .. } => *status,
            ExecutionStatusView::Detailed { record, .. } => record.status,
        }
    }

    pub fn current_step(&self) -> &str {
        match self {
            ExecutionStatusView::Summary { current_step, .. } => current_step,
            ExecutionStatusView::Detailed { record, .. } => &record.current_step,
        }
    }

    pub fn progress_percent(&self) -> f64 {
        match self {
            ExecutionStatusView::Summary {
                progress_percent, ..
            } => *progress_percent,
            ExecutionStatusView::Detailed { record, .. } => record.progress_percent,
        }
    }
}
