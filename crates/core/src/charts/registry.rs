//! Keyed store of chart execution records.
//!
//! Records are keyed by chart path. Each key is guarded by its shard lock,
//! so every operation on one chart is linearizable while operations on
//! different charts proceed independently. The clock is read inside the
//! guard, once per operation.

use crate::error::{ControlError, ControlResult};
use crate::time::TimeSource;
use bc_protocol::ChartExecutionRecord;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

pub struct ChartRegistry {
    records: DashMap<String, ChartExecutionRecord>,
    clock: Arc<dyn TimeSource>,
}

impl ChartRegistry {
    /// Create an empty registry reading time from `clock`.
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Insert a record built by `create` unless one already exists for
    /// `chart_path`. The check and the insert happen under one guard.
    pub fn insert_new<F>(&self, chart_path: &str, create: F) -> ControlResult<ChartExecutionRecord>
    where
        F: FnOnce(DateTime<Utc>) -> ChartExecutionRecord,
    {
        match self.records.entry(chart_path.to_string()) {
            Entry::Occupied(existing) => Err(ControlError::AlreadyExists(format!(
                "Chart {chart_path} ({:?})",
                existing.get().status
            ))),
            Entry::Vacant(slot) => {
                let record = create(self.clock.now());
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Apply `apply` to the record for `chart_path` while holding its guard.
    ///
    /// `apply` must leave the record untouched when it returns an error.
    pub fn update<T, F>(&self, chart_path: &str, apply: F) -> ControlResult<T>
    where
        F: FnOnce(&mut ChartExecutionRecord, DateTime<Utc>) -> ControlResult<T>,
    {
        let mut record = self
            .records
            .get_mut(chart_path)
            .ok_or_else(|| ControlError::NotFound(format!("Chart {chart_path}")))?;
        let now = self.clock.now();
        apply(record.value_mut(), now)
    }

    /// Read the record for `chart_path` through `read`, as of now.
    pub fn inspect<T, F>(&self, chart_path: &str, read: F) -> Option<T>
    where
        F: FnOnce(&ChartExecutionRecord, DateTime<Utc>) -> T,
    {
        let record = self.records.get(chart_path)?;
        let now = self.clock.now();
        Some(read(record.value(), now))
    }

    /// Remove and return the record for `chart_path`, if any.
    pub fn remove(&self, chart_path: &str) -> Option<ChartExecutionRecord> {
        self.records.remove(chart_path).map(|(_, record)| record)
    }

    /// A snapshot of the record for `chart_path`.
    pub fn get(&self, chart_path: &str) -> Option<ChartExecutionRecord> {
        self.records.get(chart_path).map(|record| record.value().clone())
    }

    /// Sorted paths of charts whose records are not terminal.
    pub fn active_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .records
            .iter()
            .filter(|entry| !entry.value().status.is_terminal())
            .map(|entry| entry.key().clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
