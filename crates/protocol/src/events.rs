//! Notifications emitted by the controllers.
//!
//! Every successful mutation produces one `Event`. Presentation layers
//! (operator consoles, audit writers) subscribe through an unbounded
//! channel handed to the controller at construction; the controllers never
//! wait on subscribers.
//!
//! Uses tagged enum serialization:
//! ```json
//! {
//!   "type": "chartStatusUpdate",
//!   "payload": {
//!     "chart_path": "Line1/Fill",
//!     "execution_id": "uuid-here",
//!     "status": "PAUSED"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chart_models::ChartStatus;
use crate::execution_models::ExecutionStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A chart was started.
    ChartStarted {
        chart_path: String,
        execution_id: Uuid,
    },

    /// A chart's status changed.
    ChartStatusUpdate {
        chart_path: String,
        execution_id: Uuid,
        status: ChartStatus,
    },

    /// A chart entered a new step.
    ChartStepChanged {
        chart_path: String,
        execution_id: Uuid,
        step: String,
    },

    /// A chart record was removed; the chart is idle again.
    ChartReset { chart_path: String },

    /// A recipe revision was created or overwritten.
    RecipeSaved { recipe_id: String, name: String },

    /// A recipe execution began.
    ExecutionStarted {
        execution_id: Uuid,
        recipe_name: String,
        equipment_id: String,
        batch_id: String,
    },

    /// A running execution reported progress.
    ExecutionProgress {
        execution_id: Uuid,
        current_step: String,
        progress_percent: f64,
    },

    /// An execution reached a terminal status.
    ExecutionFinished {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}
