//! Runtime chart execution models.
//!
//! This module defines the structures for tracking the state of running
//! sequential function charts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Name of the step a chart occupies right after it is started.
pub const INITIAL_STEP: &str = "initial";

/// Lifecycle status of a chart execution.
///
/// A chart with no record is idle. Once started, the status progresses:
/// Running -> Stopping -> Stopped
///
/// Special states:
/// - Paused: held by an operator, resumable
/// - Stopped: terminal, kept for inspection until the chart is reset
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChartStatus {
    /// Chart is actively executing steps.
    Running,

    /// Chart has been paused by an operator.
    Paused,

    /// A graceful stop was requested; the step executor has not yet
    /// confirmed completion.
    Stopping,

    /// Chart has stopped. Only a reset returns it to idle.
    Stopped,
}

impl ChartStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, ChartStatus::Stopped)
    }

    /// Whether a stop request is accepted from this status.
    pub fn accepts_stop(self) -> bool {
        matches!(
            self,
            ChartStatus::Running | ChartStatus::Paused | ChartStatus::Stopping
        )
    }
}

/// A step the chart has left, kept for audit and troubleshooting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepHistoryEntry {
    /// Name of the step.
    pub step: String,

    /// When the chart entered the step.
    pub entered_at: DateTime<Utc>,

    /// When the chart left the step.
    pub exited_at: DateTime<Utc>,
}

/// Runtime state of a single chart execution.
///
/// Each time a chart is started, a new record is created with a unique
/// execution ID. The record is keyed by `chart_path` in the registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChartExecutionRecord {
    /// Unique identifier for this execution.
    pub execution_id: Uuid,

    /// Path of the chart being executed, e.g. `Line1/Fill`.
    pub chart_path: String,

    /// Current execution status.
    pub status: ChartStatus,

    pub start_time: DateTime<Utc>,

    /// Set when a stop is requested and refreshed when the stop completes.
    pub stop_time: Option<DateTime<Utc>>,

    /// Start of the most recent pause.
    pub pause_time: Option<DateTime<Utc>>,

    /// End of the most recent pause.
    pub resume_time: Option<DateTime<Utc>>,

    /// Sum of all completed pause intervals.
    pub total_pause_duration: Duration,

    /// Number of times the chart has been paused.
    pub pause_count: u32,

    /// Whether the most recent pause was requested as a safe pause.
    pub last_pause_safe: bool,

    /// Whether the most recent stop request was forced.
    pub stop_requested_force: bool,

    /// Step the chart is executing, or was executing when it stopped.
    pub current_step: String,

    /// When the chart entered `current_step`.
    pub step_entered_at: DateTime<Utc>,

    /// Steps the chart has left, oldest first.
    pub step_history: Vec<StepHistoryEntry>,

    /// Chart variables, seeded from the start request.
    pub variables: HashMap<String, serde_json::Value>,
}

impl ChartExecutionRecord {
    /// Create a running record positioned at the initial step.
    pub fn new(
        chart_path: String,
        variables: HashMap<String, serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            chart_path,
            status: ChartStatus::Running,
            start_time: now,
            stop_time: None,
            pause_time: None,
            resume_time: None,
            total_pause_duration: Duration::ZERO,
            pause_count: 0,
            last_pause_safe: false,
            stop_requested_force: false,
            current_step: INITIAL_STEP.to_string(),
            step_entered_at: now,
            step_history: Vec::new(),
            variables,
        }
    }
}

/// A status query answer: the record plus computed timing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChartStatusReport {
    #[serde(flatten)]
    pub record: ChartExecutionRecord,

    /// Wall time since start. Frozen at `stop_time` once a stop was requested.
    pub elapsed_seconds: f64,

    /// Elapsed time minus all pause time, including a pause in progress.
    pub active_seconds: f64,
}
