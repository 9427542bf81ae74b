//! The assembled control system.
//!
//! [`ControlSystem`] wires a [`ChartController`] and a [`RecipeManager`] to
//! one clock and one set of settings. The two halves share nothing else;
//! callers use them directly through the public fields. Dropping the
//! system releases every record.

use crate::charts::{ChartController, ChartRegistry};
use crate::config::loader::load_config;
use crate::recipes::{ExecutionRegistry, RecipeManager, RecipeStore};
use crate::time::{SystemClock, TimeSource};
use anyhow::Context;
use bc_protocol::{ControlSettings, Event};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

pub struct ControlSystem {
    pub charts: ChartController,
    pub recipes: RecipeManager,
    settings: ControlSettings,
}

impl ControlSystem {
    /// Build an empty system reading time from `clock`.
    pub fn new(clock: Arc<dyn TimeSource>, settings: ControlSettings) -> Self {
        let charts = ChartController::new(ChartRegistry::new(clock.clone())).with_settings(&settings);
        let recipes = RecipeManager::new(RecipeStore::new(), ExecutionRegistry::new(clock))
            .with_settings(&settings);

        Self {
            charts,
            recipes,
            settings,
        }
    }

    /// Load `.batch-control/` under `root` and build a system seeded with
    /// its recipes, on the system clock.
    pub fn bootstrap(root: &Path) -> anyhow::Result<Self> {
        Self::bootstrap_with_clock(root, Arc::new(SystemClock))
    }

    /// Like [`ControlSystem::bootstrap`], reading time from `clock`.
    pub fn bootstrap_with_clock(root: &Path, clock: Arc<dyn TimeSource>) -> anyhow::Result<Self> {
        let config = load_config(root).with_context(|| {
            format!("Failed to load configuration from {}", root.display())
        })?;

        let found = config.recipes.len();
        let system = Self::new(clock, config.settings);
        let imported = system.recipes.import_recipes(config.recipes);

        info!(root = %root.display(), found, imported, "Control system ready");
        Ok(system)
    }

    /// Send chart and recipe events to `events_tx`.
    pub fn with_events(self, events_tx: UnboundedSender<Event>) -> Self {
        Self {
            charts: self.charts.with_events(events_tx.clone()),
            recipes: self.recipes.with_events(events_tx),
            settings: self.settings,
        }
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }
}
