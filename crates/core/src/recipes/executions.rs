//! Keyed store of recipe execution records.
//!
//! Executions are kept until the process exits so history queries can
//! answer for finished batches. Each execution id is guarded by its shard
//! lock; the clock is read inside the guard, once per operation.

use crate::error::{ControlError, ControlResult};
use crate::time::TimeSource;
use bc_protocol::RecipeExecutionRecord;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

struct StoredExecution {
    /// Creation order, used to break start_time ties in history.
    seq: u64,
    record: RecipeExecutionRecord,
}

pub struct ExecutionRegistry {
    executions: DashMap<Uuid, StoredExecution>,
    next_seq: AtomicU64,
    clock: Arc<dyn TimeSource>,
}

impl ExecutionRegistry {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            executions: DashMap::new(),
            next_seq: AtomicU64::new(0),
            clock,
        }
    }

    /// Current time from the registry's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Store `record` under its execution id.
    pub fn insert(&self, record: RecipeExecutionRecord) -> ControlResult<()> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        match self.executions.entry(record.execution_id) {
            Entry::Occupied(_) => Err(ControlError::AlreadyExists(
                format!("Execution {}", record.execution_id),
            )),
            Entry::Vacant(slot) => {
                slot.insert(StoredExecution { seq, record });
                Ok(())
            }
        }
    }

    /// Apply `apply` to the execution while holding its guard.
    ///
    /// `apply` must leave the record untouched when it returns an error.
    pub fn update<T, F>(&self, execution_id: Uuid, apply: F) -> ControlResult<T>
    where
        F: FnOnce(&mut RecipeExecutionRecord, DateTime<Utc>) -> ControlResult<T>,
    {
        let mut stored = self
            .executions
            .get_mut(&execution_id)
            .ok_or_else(|| ControlError::NotFound(format!("Execution {execution_id}")))?;
        let now = self.clock.now();
        apply(&mut stored.record, now)
    }

    /// Read the execution through `read`, as of now.
    pub fn inspect<T, F>(&self, execution_id: Uuid, read: F) -> Option<T>
    where
        F: FnOnce(&RecipeExecutionRecord, DateTime<Utc>) -> T,
    {
        let stored = self.executions.get(&execution_id)?;
        let now = self.clock.now();
        Some(read(&stored.record, now))
    }

    /// Executions of recipes named `recipe_name`, most recently started
    /// first, mapped through `view` and truncated to `limit`.
    pub fn history<T, F>(&self, recipe_name: &str, limit: usize, view: F) -> Vec<T>
    where
        F: Fn(&RecipeExecutionRecord, DateTime<Utc>) -> T,
    {
        let mut matching: Vec<(DateTime<Utc>, u64, RecipeExecutionRecord)> = self
            .executions
            .iter()
            .filter(|entry| entry.record.recipe_name == recipe_name)
            .map(|entry| (entry.record.start_time, entry.seq, entry.record.clone()))
            .collect();
        matching.sort_by_key(|(start, seq, _)| Reverse((*start, *seq)));
        matching.truncate(limit);

        let now = self.clock.now();
        matching
            .iter()
            .map(|(_, _, record)| view(record, now))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }
}
