//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `ControlConfig` structure that combines
//! the settings file and the recipe seed files into a single object.

use bc_protocol::{ControlSettings, RecipeFile};

/// Unified configuration loaded from the `.batch-control/` directory.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Controller settings
/// - `recipes/*.yaml`: Recipes seeded into the store at startup
///
/// # Example
///
/// ```rust,no_run
/// use bc_core::config::loader::load_config;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("."))?;
/// println!("Loaded {} recipes", config.recipes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlConfig {
    /// Settings from `config.toml`.
    pub settings: ControlSettings,

    /// Recipe files from `recipes/*.yaml` and `recipes/*.yml`, ordered by
    /// file name.
    pub recipes: Vec<RecipeFile>,
}
