//! Chart state machine implementation.
//!
//! This module provides the transition functions for a chart execution
//! record. Each function either applies the full transition or returns an
//! error without touching the record.
//!
//! ```text
//! idle --start--> Running --pause--> Paused --resume--> Running
//!                    |                  |
//!                    +------stop--------+--> Stopping --confirm--> Stopped
//!                    +------stop(force)-+------------------------> Stopped
//! any --reset--> idle
//! ```

use crate::error::{ControlError, ControlResult};
use crate::time::{seconds_between, span};
use bc_protocol::{ChartExecutionRecord, ChartStatus, ChartStatusReport, StepHistoryEntry};
use chrono::{DateTime, Utc};

/// Check that a chart path is well formed.
///
/// A path is one or more `/`-separated segments. Segments are non-empty,
/// carry no surrounding whitespace, and use letters, digits, spaces, `_`,
/// `-` or `.`. Whether the chart exists on the target system is not
/// checked here.
pub fn validate_chart_path(path: &str, max_len: usize) -> ControlResult<()> {
    let invalid = |reason: &str| ControlError::InvalidKey {
        key: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("chart path is empty"));
    }
    if path.len() > max_len {
        return Err(invalid(&format!("chart path exceeds {max_len} bytes")));
    }

    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(invalid("chart path has an empty segment"));
        }
        if segment.trim() != segment {
            return Err(invalid("chart path segment has surrounding whitespace"));
        }
        if let Some(c) = segment
            .chars()
            .find(|c| !(c.is_alphanumeric() || matches!(c, ' ' | '_' | '-' | '.')))
        {
            return Err(invalid(&format!("chart path contains {c:?}")));
        }
    }

    Ok(())
}

/// Transition Running -> Paused.
///
/// `safe` is recorded for audit only; the transition is the same.
pub fn pause(record: &mut ChartExecutionRecord, safe: bool, now: DateTime<Utc>) -> ControlResult<()> {
    if record.status != ChartStatus::Running {
        return Err(ControlError::InvalidState {
            operation: "pause",
            status: record.status,
        });
    }

    record.status = ChartStatus::Paused;
    record.pause_time = Some(now);
    record.pause_count += 1;
    record.last_pause_safe = safe;
    Ok(())
}

/// Transition Paused -> Running, adding the pause interval to the total.
pub fn resume(record: &mut ChartExecutionRecord, now: DateTime<Utc>) -> ControlResult<()> {
    if record.status != ChartStatus::Paused {
        return Err(ControlError::InvalidState {
            operation: "resume",
            status: record.status,
        });
    }

    close_pause_interval(record, now);
    record.status = ChartStatus::Running;
    record.resume_time = Some(now);
    Ok(())
}

/// Request a stop.
///
/// A forced stop goes straight to Stopped. A graceful stop goes to
/// Stopping and waits for [`confirm_stopped`]. A forced stop may escalate
/// a pending graceful one; a second graceful request is rejected.
/// Stopping a paused chart closes the open pause interval.
pub fn request_stop(
    record: &mut ChartExecutionRecord,
    force: bool,
    now: DateTime<Utc>,
) -> ControlResult<()> {
    let accepted = record.status.accepts_stop() && (force || record.status != ChartStatus::Stopping);
    if !accepted {
        return Err(ControlError::InvalidState {
            operation: "stop",
            status: record.status,
        });
    }

    if record.status == ChartStatus::Paused {
        close_pause_interval(record, now);
    }

    record.status = if force {
        ChartStatus::Stopped
    } else {
        ChartStatus::Stopping
    };
    record.stop_time = Some(now);
    record.stop_requested_force = force;
    Ok(())
}

/// Transition Stopping -> Stopped once the step executor confirms.
pub fn confirm_stopped(record: &mut ChartExecutionRecord, now: DateTime<Utc>) -> ControlResult<()> {
    if record.status != ChartStatus::Stopping {
        return Err(ControlError::InvalidState {
            operation: "confirm stop of",
            status: record.status,
        });
    }

    record.status = ChartStatus::Stopped;
    record.stop_time = Some(now);
    Ok(())
}

/// Move the chart to `step`, closing the current step into the history.
///
/// Allowed while Running, and while Stopping so the executor can report
/// the steps it passes on its way out.
pub fn advance_step(
    record: &mut ChartExecutionRecord,
    step: &str,
    now: DateTime<Utc>,
) -> ControlResult<()> {
    if step.trim().is_empty() {
        return Err(ControlError::InvalidKey {
            key: step.to_string(),
            reason: "step name is empty".to_string(),
        });
    }
    if !matches!(record.status, ChartStatus::Running | ChartStatus::Stopping) {
        return Err(ControlError::InvalidState {
            operation: "advance",
            status: record.status,
        });
    }

    let previous = std::mem::replace(&mut record.current_step, step.to_string());
    record.step_history.push(StepHistoryEntry {
        step: previous,
        entered_at: record.step_entered_at,
        exited_at: now,
    });
    record.step_entered_at = now;
    Ok(())
}

/// Set a chart variable on a chart that has not stopped.
pub fn set_variable(
    record: &mut ChartExecutionRecord,
    key: &str,
    value: serde_json::Value,
) -> ControlResult<()> {
    if record.status.is_terminal() {
        return Err(ControlError::InvalidState {
            operation: "set a variable on",
            status: record.status,
        });
    }

    record.variables.insert(key.to_string(), value);
    Ok(())
}

/// Build a status report with elapsed and active runtime as of `now`.
pub fn report(record: &ChartExecutionRecord, now: DateTime<Utc>) -> ChartStatusReport {
    let end = record.stop_time.unwrap_or(now);
    let elapsed_seconds = seconds_between(record.start_time, end);

    let open_pause = match (record.status, record.pause_time) {
        (ChartStatus::Paused, Some(paused_at)) => seconds_between(paused_at, now),
        _ => 0.0,
    };
    let paused = record.total_pause_duration.as_secs_f64() + open_pause;

    ChartStatusReport {
        record: record.clone(),
        elapsed_seconds,
        active_seconds: (elapsed_seconds - paused).max(0.0),
    }
}

fn close_pause_interval(record: &mut ChartExecutionRecord, now: DateTime<Utc>) {
    if let Some(paused_at) = record.pause_time {
        record.total_pause_duration += span(paused_at, now);
    }
}
