//! Recipe lifecycle management.
//!
//! The RecipeManager owns recipe storage and recipe executions. It is
//! independent of chart control: an execution tracks a batch against
//! equipment, the steps themselves are driven by an external executor
//! that reports back through [`RecipeManager::update_progress`],
//! [`RecipeManager::complete_execution`] and
//! [`RecipeManager::fail_execution`].
//!
//! As with chart control, operations answer `false`/`None` instead of
//! returning errors, and log why.

use crate::error::{ControlError, ControlResult};
use crate::recipes::estimator::{CompletionEstimator, NoEstimate};
use crate::recipes::executions::ExecutionRegistry;
use crate::recipes::store::RecipeStore;
use crate::recipes::validation::{self, LATEST};
use crate::time::seconds_between;
use bc_protocol::{
    ControlSettings, Event, ExecutionStatus, ExecutionStatusView, ExecutionStepEntry,
    RecipeDefinition, RecipeExecutionRecord, RecipeFile, DEFAULT_RECIPE_VERSION, INITIAL_STEP,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Manages recipe storage and the lifecycle of recipe executions.
pub struct RecipeManager {
    store: RecipeStore,
    executions: ExecutionRegistry,
    settings: ControlSettings,
    estimator: Arc<dyn CompletionEstimator>,
    events_tx: Option<UnboundedSender<Event>>,
    /// Last generated batch id stem and how often it was issued.
    last_batch_stem: Mutex<Option<(String, u32)>>,
}

impl RecipeManager {
    /// Create a manager owning `store` and `executions`.
    ///
    /// Timestamps come from the execution registry's clock.
    pub fn new(store: RecipeStore, executions: ExecutionRegistry) -> Self {
        Self {
            store,
            executions,
            settings: ControlSettings::default(),
            estimator: Arc::new(NoEstimate),
            events_tx: None,
            last_batch_stem: Mutex::new(None),
        }
    }

    pub fn with_settings(mut self, settings: &ControlSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    /// Use `estimator` for `estimated_completion` in detailed status views.
    pub fn with_estimator(mut self, estimator: Arc<dyn CompletionEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_events(mut self, events_tx: UnboundedSender<Event>) -> Self {
        self.events_tx = Some(events_tx);
        self
    }

    /// Create a new recipe revision from `template`.
    ///
    /// The template must declare `ingredients` and `steps`. Entries may be
    /// bare names or objects; see [`bc_protocol::Ingredient`] and
    /// [`bc_protocol::RecipeStep`].
    ///
    /// # Arguments
    ///
    /// * `name` - Recipe name shared by all its revisions
    /// * `template` - JSON object with the recipe sections
    /// * `description` - Free text, empty when `None`
    /// * `version` - Version label, `1.0` when `None`
    ///
    /// # Returns
    ///
    /// The new recipe id, or `None` if the input was rejected. Repeated
    /// creation with the same name and version yields distinct ids.
    pub fn create_recipe(
        &self,
        name: &str,
        template: &Value,
        description: Option<&str>,
        version: Option<&str>,
    ) -> Option<String> {
        let version = version.unwrap_or(DEFAULT_RECIPE_VERSION);
        let result = validation::validate_key("recipe name", name)
            .and_then(|()| validation::validate_version(version))
            .and_then(|()| validation::parse_template(template))
            .and_then(|content| {
                let now = self.executions.now();
                let definition = RecipeDefinition {
                    recipe_id: validation::generate_recipe_id(name, version),
                    name: name.to_string(),
                    version: version.to_string(),
                    description: description.unwrap_or_default().to_string(),
                    created_date: now,
                    modified_date: now,
                    content,
                };
                let recipe_id = definition.recipe_id.clone();
                self.store.insert(definition)?;
                Ok(recipe_id)
            });

        let recipe_id = accept("create_recipe", name, result)?;
        info!(recipe = name, version, %recipe_id, "Recipe created");
        self.emit(Event::RecipeSaved {
            recipe_id: recipe_id.clone(),
            name: name.to_string(),
        });
        Some(recipe_id)
    }

    /// Load a recipe by name.
    ///
    /// # Arguments
    ///
    /// * `name` - Recipe name
    /// * `version` - `None` or `"latest"` selects the most recently created
    ///   revision; any other value must match exactly
    ///
    /// # Returns
    ///
    /// A copy of the stored revision, or `None` when nothing matches.
    pub fn load_recipe(&self, name: &str, version: Option<&str>) -> Option<RecipeDefinition> {
        let recipe = match version {
            None | Some(LATEST) => self.store.latest(name),
            Some(version) => self.store.find(name, version),
        };
        if recipe.is_none() {
            debug!(recipe = name, ?version, "Recipe not found");
        }
        recipe
    }

    /// Save full recipe data under `name`.
    ///
    /// `data` must carry `name`, `version`, `ingredients` and `steps`. If a
    /// recipe with this name exists the save fails unless `overwrite` is
    /// set, in which case the latest revision is replaced in place.
    pub fn save_recipe(&self, name: &str, data: &Value, overwrite: bool) -> bool {
        let result = validation::validate_key("recipe name", name)
            .and_then(|()| validation::parse_recipe_data(name, data))
            .and_then(|recipe| self.store.save(recipe, overwrite, self.executions.now()));

        let Some(saved) = accept("save_recipe", name, result) else {
            return false;
        };

        info!(recipe = name, recipe_id = %saved.recipe_id, overwrite, "Recipe saved");
        self.emit(Event::RecipeSaved {
            recipe_id: saved.recipe_id,
            name: saved.name,
        });
        true
    }

    /// Start an execution of the latest revision of `name` on `equipment_id`.
    ///
    /// The execution starts at the recipe's first step, or `initial` when
    /// the recipe declares none.
    ///
    /// # Arguments
    ///
    /// * `name` - Recipe name; the latest revision is used
    /// * `equipment_id` - Equipment the batch runs on
    /// * `batch_id` - Batch label; when missing or blank one is generated
    ///   from the configured prefix and the start timestamp
    /// * `execution_parameters` - Caller parameters stored on the record
    ///
    /// # Returns
    ///
    /// The execution id, or `None` if the recipe is unknown or the input
    /// was rejected.
    pub fn execute_recipe(
        &self,
        name: &str,
        equipment_id: &str,
        batch_id: Option<&str>,
        execution_parameters: Option<HashMap<String, Value>>,
    ) -> Option<Uuid> {
        let result = validation::validate_key("recipe name", name)
            .and_then(|()| validation::validate_key("equipment id", equipment_id))
            .and_then(|()| {
                self.store
                    .latest(name)
                    .ok_or_else(|| ControlError::NotFound(format!("Recipe {name}")))
            })
            .and_then(|recipe| {
                let now = self.executions.now();
                let record = self.new_execution(
                    &recipe,
                    equipment_id,
                    batch_id,
                    execution_parameters.unwrap_or_default(),
                    now,
                );
                self.executions.insert(record.clone())?;
                Ok(record)
            });

        let record = accept("execute_recipe", name, result)?;
        info!(
            recipe = name,
            equipment_id,
            batch_id = %record.batch_id,
            execution_id = %record.execution_id,
            "Recipe execution started"
        );
        self.emit(Event::ExecutionStarted {
            execution_id: record.execution_id,
            recipe_name: record.recipe_name,
            equipment_id: record.equipment_id,
            batch_id: record.batch_id,
        });
        Some(record.execution_id)
    }

    /// Abort a running execution.
    ///
    /// # Arguments
    ///
    /// * `execution_id` - Execution to abort
    /// * `reason` - Recorded reason; the configured default when `None`
    /// * `safe_abort` - Recorded for audit only. Waiting for a safe point is
    ///   the step executor's job
    ///
    /// # Returns
    ///
    /// `false` if the execution is unknown or already finished.
    pub fn abort_execution(&self, execution_id: Uuid, reason: Option<&str>, safe_abort: bool) -> bool {
        let reason = reason.unwrap_or(&self.settings.default_abort_reason);
        let result = self.executions.update(execution_id, |record, now| {
            finish(record, ExecutionStatus::Aborted, now)?;
            record.abort_reason = Some(reason.to_string());
            record.safe_abort = Some(safe_abort);
            Ok(())
        });
        self.finished("abort_execution", execution_id, ExecutionStatus::Aborted, result)
    }

    /// Mark a running execution as completed at 100% progress.
    pub fn complete_execution(&self, execution_id: Uuid) -> bool {
        let result = self.executions.update(execution_id, |record, now| {
            finish(record, ExecutionStatus::Completed, now)?;
            record.progress_percent = 100.0;
            Ok(())
        });
        self.finished("complete_execution", execution_id, ExecutionStatus::Completed, result)
    }

    /// Mark a running execution as failed with `error`.
    pub fn fail_execution(&self, execution_id: Uuid, error: &str) -> bool {
        let result = self.executions.update(execution_id, |record, now| {
            finish(record, ExecutionStatus::Failed, now)?;
            record.error = Some(error.to_string());
            Ok(())
        });
        self.finished("fail_execution", execution_id, ExecutionStatus::Failed, result)
    }

    /// Report progress of a running execution.
    ///
    /// Progress is clamped to 0..=100 first; the clamped value may not be
    /// below the current progress. Entering a new step appends it to the
    /// execution's step history.
    pub fn update_progress(&self, execution_id: Uuid, step: &str, progress_percent: f64) -> bool {
        let result = validation::validate_key("step name", step).and_then(|()| {
            self.executions.update(execution_id, |record, now| {
                if record.status.is_terminal() {
                    return Err(ControlError::TerminalExecution(record.status));
                }
                if progress_percent.is_nan() {
                    return Err(ControlError::InvalidProgress {
                        reported: progress_percent,
                        current: record.progress_percent,
                    });
                }
                let progress = progress_percent.clamp(0.0, 100.0);
                if progress < record.progress_percent {
                    return Err(ControlError::InvalidProgress {
                        reported: progress_percent,
                        current: record.progress_percent,
                    });
                }

                if record.current_step != step {
                    record.current_step = step.to_string();
                    record.step_history.push(ExecutionStepEntry {
                        step: step.to_string(),
                        entered_at: now,
                        progress_percent: progress,
                    });
                }
                record.progress_percent = progress;
                Ok(progress)
            })
        });

        let Some(progress) = accept("update_progress", execution_id, result) else {
            return false;
        };

        debug!(%execution_id, step, progress, "Execution progress");
        self.emit(Event::ExecutionProgress {
            execution_id,
            current_step: step.to_string(),
            progress_percent: progress,
        });
        true
    }

    /// Status of an execution.
    ///
    /// # Arguments
    ///
    /// * `execution_id` - Execution to report
    /// * `include_details` - Whether to return the full record
    ///
    /// # Returns
    ///
    /// Without details, the summary projection for polling. With details,
    /// the full record plus `runtime_minutes` and `estimated_completion`
    /// while running. `None` for an unknown id.
    pub fn get_execution_status(
        &self,
        execution_id: Uuid,
        include_details: bool,
    ) -> Option<ExecutionStatusView> {
        let view = self
            .executions
            .inspect(execution_id, |record, now| self.view(record, include_details, now));
        if view.is_none() {
            debug!(%execution_id, "Execution not found");
        }
        view
    }

    /// Executions of every revision named `name`, most recently started
    /// first. `limit` defaults to the configured history limit.
    pub fn get_execution_history(
        &self,
        name: &str,
        limit: Option<usize>,
        include_details: bool,
    ) -> Vec<ExecutionStatusView> {
        let limit = limit.unwrap_or(self.settings.history_limit);
        self.executions
            .history(name, limit, |record, now| self.view(record, include_details, now))
    }

    /// All stored recipe revisions, newest first.
    pub fn list_recipes(&self) -> Vec<RecipeDefinition> {
        self.store.list()
    }

    /// Seed the store with recipes read from configuration files.
    ///
    /// Each file becomes a new revision. Invalid files are skipped and
    /// logged. Returns the number imported.
    pub fn import_recipes(&self, recipes: Vec<RecipeFile>) -> usize {
        let now = self.executions.now();
        let mut imported = 0;

        for recipe in recipes {
            let result = validation::validate_key("recipe name", &recipe.name)
                .and_then(|()| validation::validate_version(&recipe.version))
                .and_then(|()| {
                    self.store.insert(RecipeDefinition {
                        recipe_id: validation::generate_recipe_id(&recipe.name, &recipe.version),
                        name: recipe.name.clone(),
                        version: recipe.version.clone(),
                        description: recipe.description,
                        created_date: now,
                        modified_date: now,
                        content: recipe.content,
                    })
                });
            if accept("import_recipes", &recipe.name, result).is_some() {
                debug!(recipe = %recipe.name, version = %recipe.version, "Recipe imported");
                imported += 1;
            }
        }

        imported
    }

    pub fn recipe_count(&self) -> usize {
        self.store.len()
    }

    pub fn execution_count(&self) -> usize {
        self.executions.len()
    }

    fn new_execution(
        &self,
        recipe: &RecipeDefinition,
        equipment_id: &str,
        batch_id: Option<&str>,
        execution_parameters: HashMap<String, Value>,
        now: DateTime<Utc>,
    ) -> RecipeExecutionRecord {
        let batch_id = match batch_id.map(str::trim) {
            Some(batch_id) if !batch_id.is_empty() => batch_id.to_string(),
            _ => self.generate_batch_id(now),
        };
        let first_step = recipe.first_step().unwrap_or(INITIAL_STEP).to_string();

        RecipeExecutionRecord {
            execution_id: Uuid::new_v4(),
            recipe_id: recipe.recipe_id.clone(),
            recipe_name: recipe.name.clone(),
            recipe_version: recipe.version.clone(),
            equipment_id: equipment_id.to_string(),
            batch_id,
            status: ExecutionStatus::Running,
            start_time: now,
            end_time: None,
            duration_minutes: None,
            progress_percent: 0.0,
            current_step: first_step.clone(),
            execution_parameters,
            step_history: vec![ExecutionStepEntry {
                step: first_step,
                entered_at: now,
                progress_percent: 0.0,
            }],
            abort_reason: None,
            safe_abort: None,
            error: None,
        }
    }

    /// `<prefix><YYYYmmdd_HHMMSS>`, with `_2`, `_3`, ... appended when
    /// several batches are generated within the same second.
    fn generate_batch_id(&self, now: DateTime<Utc>) -> String {
        let stem = format!("{}{}", self.settings.batch_id_prefix, now.format("%Y%m%d_%H%M%S"));
        let mut last = self.last_batch_stem.lock();
        let issued = match &mut *last {
            Some((last_stem, count)) if *last_stem == stem => {
                *count += 1;
                *count
            }
            slot => {
                *slot = Some((stem.clone(), 1));
                1
            }
        };

        if issued == 1 {
            stem
        } else {
            format!("{stem}_{issued}")
        }
    }

    fn view(
        &self,
        record: &RecipeExecutionRecord,
        include_details: bool,
        now: DateTime<Utc>,
    ) -> ExecutionStatusView {
        if !include_details {
            return ExecutionStatusView::Summary {
                execution_id: record.execution_id,
                status: record.status,
                progress_percent: record.progress_percent,
                current_step: record.current_step.clone(),
            };
        }

        let running = record.status == ExecutionStatus::Running;
        let runtime_minutes = running.then(|| seconds_between(record.start_time, now) / 60.0);
        let estimated_completion = if running {
            let recipe = self.store.get(&record.recipe_id);
            self.estimator.estimate(record, recipe.as_ref(), now)
        } else {
            None
        };

        ExecutionStatusView::Detailed {
            record: Box::new(record.clone()),
            runtime_minutes,
            estimated_completion,
        }
    }

    fn finished(
        &self,
        operation: &'static str,
        execution_id: Uuid,
        status: ExecutionStatus,
        result: ControlResult<()>,
    ) -> bool {
        if accept(operation, execution_id, result).is_none() {
            return false;
        }

        info!(%execution_id, %status, "Recipe execution finished");
        self.emit(Event::ExecutionFinished {
            execution_id,
            status,
        });
        true
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event);
        }
    }
}

/// Move a running execution to the terminal `status`, stamping end time
/// and duration.
fn finish(
    record: &mut RecipeExecutionRecord,
    status: ExecutionStatus,
    now: DateTime<Utc>,
) -> ControlResult<()> {
    if !record.status.can_transition_to(status) {
        return Err(ControlError::TerminalExecution(record.status));
    }

    record.status = status;
    record.end_time = Some(now);
    record.duration_minutes = Some(seconds_between(record.start_time, now) / 60.0);
    Ok(())
}

fn accept<T>(operation: &'static str, key: impl Display, result: ControlResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, operation, error = %e, "Recipe operation rejected");
            None
        }
    }
}
