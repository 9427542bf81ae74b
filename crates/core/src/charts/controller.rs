//! Public chart execution control.
//!
//! The ChartController is the only way to mutate chart execution records.
//! It enforces the chart state machine, answers status and history
//! queries, and emits an [`Event`] for every successful transition.
//!
//! Mutating operations answer `true` when the full transition happened and
//! `false` when nothing changed. The reason for a `false` is logged; retry
//! policy belongs to the caller.

use crate::charts::registry::ChartRegistry;
use crate::charts::state;
use crate::error::ControlResult;
use bc_protocol::{
    ChartExecutionRecord, ChartStatus, ChartStatusReport, ControlSettings, Event,
    StepHistoryEntry,
};
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Enforces the chart execution state machine over a [`ChartRegistry`].
pub struct ChartController {
    registry: ChartRegistry,
    max_path_len: usize,
    events_tx: Option<UnboundedSender<Event>>,
}

impl ChartController {
    /// Create a controller owning `registry`, with default settings.
    pub fn new(registry: ChartRegistry) -> Self {
        Self {
            registry,
            max_path_len: ControlSettings::default().max_chart_path_len,
            events_tx: None,
        }
    }

    /// Apply limits from `settings`.
    pub fn with_settings(mut self, settings: &ControlSettings) -> Self {
        self.max_path_len = settings.max_chart_path_len;
        self
    }

    /// Send an event for every successful transition to `events_tx`.
    pub fn with_events(mut self, events_tx: UnboundedSender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Start `chart_path` with optional initial variables.
    ///
    /// # Arguments
    ///
    /// * `chart_path` - `/`-separated chart path, e.g. `Line1/Fill`
    /// * `initial_variables` - Chart variables, empty when `None`
    ///
    /// # Returns
    ///
    /// `true` if the chart is now Running at the `initial` step with an
    /// empty history. `false` if the path is malformed or any record exists
    /// for it, including a stopped one that has not been reset.
    pub fn start(
        &self,
        chart_path: &str,
        initial_variables: Option<HashMap<String, serde_json::Value>>,
    ) -> bool {
        let result = state::validate_chart_path(chart_path, self.max_path_len).and_then(|()| {
            self.registry.insert_new(chart_path, |now| {
                ChartExecutionRecord::new(
                    chart_path.to_string(),
                    initial_variables.unwrap_or_default(),
                    now,
                )
            })
        });

        let Some(record) = self.accept("start", chart_path, result) else {
            return false;
        };

        info!(chart_path, execution_id = %record.execution_id, "Chart started");
        self.emit(Event::ChartStarted {
            chart_path: chart_path.to_string(),
            execution_id: record.execution_id,
        });
        true
    }

    /// Stop `chart_path`.
    ///
    /// # Arguments
    ///
    /// * `chart_path` - Chart to stop
    /// * `force` - Stop immediately. Otherwise the chart moves to Stopping
    ///   and the step executor completes the stop through
    ///   [`confirm_stopped`](Self::confirm_stopped)
    ///
    /// # Returns
    ///
    /// `false` if the chart is idle, already stopped, or already stopping
    /// gracefully and `force` is not set.
    pub fn stop(&self, chart_path: &str, force: bool) -> bool {
        let result = self.registry.update(chart_path, |record, now| {
            state::request_stop(record, force, now)?;
            Ok((record.execution_id, record.status))
        });
        self.transitioned("stop", chart_path, result)
    }

    /// Pause a running chart. `safe` is recorded for audit only.
    pub fn pause(&self, chart_path: &str, safe: bool) -> bool {
        let result = self.registry.update(chart_path, |record, now| {
            state::pause(record, safe, now)?;
            Ok((record.execution_id, record.status))
        });
        self.transitioned("pause", chart_path, result)
    }

    /// Resume a paused chart.
    pub fn resume(&self, chart_path: &str) -> bool {
        let result = self.registry.update(chart_path, |record, now| {
            state::resume(record, now)?;
            Ok((record.execution_id, record.status))
        });
        self.transitioned("resume", chart_path, result)
    }

    /// Complete a graceful stop. Called by the step executor once the chart
    /// has actually finished.
    pub fn confirm_stopped(&self, chart_path: &str) -> bool {
        let result = self.registry.update(chart_path, |record, now| {
            state::confirm_stopped(record, now)?;
            Ok((record.execution_id, record.status))
        });
        self.transitioned("confirm_stopped", chart_path, result)
    }

    /// Remove any record for `chart_path`, returning the chart to idle.
    ///
    /// Always succeeds, whatever the chart's status.
    pub fn reset(&self, chart_path: &str) -> bool {
        match self.registry.remove(chart_path) {
            Some(record) => {
                info!(chart_path, status = ?record.status, "Chart reset");
                self.emit(Event::ChartReset {
                    chart_path: chart_path.to_string(),
                });
            }
            None => debug!(chart_path, "Reset of idle chart"),
        }
        true
    }

    /// Record that the chart entered `step`.
    pub fn advance_step(&self, chart_path: &str, step: &str) -> bool {
        let result = self.registry.update(chart_path, |record, now| {
            state::advance_step(record, step, now)?;
            Ok(record.execution_id)
        });

        let Some(execution_id) = self.accept("advance_step", chart_path, result) else {
            return false;
        };

        debug!(chart_path, step, "Chart step changed");
        self.emit(Event::ChartStepChanged {
            chart_path: chart_path.to_string(),
            execution_id,
            step: step.to_string(),
        });
        true
    }

    /// Set a variable on a chart that has not stopped.
    pub fn set_variable(&self, chart_path: &str, key: &str, value: serde_json::Value) -> bool {
        let result = self
            .registry
            .update(chart_path, |record, _| state::set_variable(record, key, value));
        self.accept("set_variable", chart_path, result).is_some()
    }

    /// Current record with elapsed and active runtime, or `None` when idle.
    pub fn status(&self, chart_path: &str) -> Option<ChartStatusReport> {
        self.registry.inspect(chart_path, state::report)
    }

    pub fn current_step(&self, chart_path: &str) -> Option<String> {
        self.registry
            .inspect(chart_path, |record, _| record.current_step.clone())
    }

    /// Steps the chart has left, oldest first. Empty when idle.
    pub fn step_history(&self, chart_path: &str) -> Vec<StepHistoryEntry> {
        self.registry
            .inspect(chart_path, |record, _| record.step_history.clone())
            .unwrap_or_default()
    }

    /// Sorted paths of charts that are running, paused or stopping.
    pub fn active_charts(&self) -> Vec<String> {
        self.registry.active_paths()
    }

    /// Number of chart records, including stopped ones awaiting reset.
    pub fn chart_count(&self) -> usize {
        self.registry.len()
    }

    fn transitioned(
        &self,
        operation: &'static str,
        chart_path: &str,
        result: ControlResult<(Uuid, ChartStatus)>,
    ) -> bool {
        let Some((execution_id, status)) = self.accept(operation, chart_path, result) else {
            return false;
        };

        info!(chart_path, %execution_id, ?status, operation, "Chart transitioned");
        self.emit(Event::ChartStatusUpdate {
            chart_path: chart_path.to_string(),
            execution_id,
            status,
        });
        true
    }

    fn accept<T>(
        &self,
        operation: &'static str,
        chart_path: &str,
        result: ControlResult<T>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(chart_path, operation, error = %e, "Chart operation rejected");
                None
            }
        }
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event);
        }
    }
}
