//! Completion estimates for running executions.
//!
//! No duration model is built in. Sites that have one (historical batch
//! times, step durations from the recipe) plug it in through
//! [`CompletionEstimator`].

use bc_protocol::{RecipeDefinition, RecipeExecutionRecord};
use chrono::{DateTime, Utc};

/// Estimates when a running execution will finish.
pub trait CompletionEstimator: Send + Sync {
    /// Estimated completion time, or `None` when no estimate is possible.
    ///
    /// `recipe` is the revision the execution runs, if it is still stored.
    fn estimate(
        &self,
        execution: &RecipeExecutionRecord,
        recipe: Option<&RecipeDefinition>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>>;
}

/// The default estimator: never estimates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEstimate;

impl CompletionEstimator for NoEstimate {
    fn estimate(
        &self,
        _execution: &RecipeExecutionRecord,
        _recipe: Option<&RecipeDefinition>,
        _now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        None
    }
}
