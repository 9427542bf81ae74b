//! Configuration file loader for the `.batch-control/` directory structure.
//!
//! This module loads and parses:
//! - `config.toml`: Controller settings
//! - `recipes/*.yaml` and `recipes/*.yml`: Recipe seed files

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::ControlConfig;
use bc_protocol::{ControlSettings, RecipeFile};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Name of the configuration directory under the root.
pub const CONFIG_DIR: &str = ".batch-control";

/// Loads all configuration from the `.batch-control/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.batch-control/` folder
///
/// # Returns
///
/// A `ControlConfig` with everything found. Missing directories or files
/// yield defaults rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid TOML or YAML syntax
/// - Values parse but are unusable (zero path length, blank recipe name)
///
/// # Example
///
/// ```rust,no_run
/// use bc_core::config::loader::load_config;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("."))?;
/// println!("History limit: {}", config.settings.history_limit);
/// # Ok(())
/// # }
/// ```
pub fn load_config(root: &Path) -> ConfigResult<ControlConfig> {
    let bc_dir = root.join(CONFIG_DIR);

    if !bc_dir.exists() {
        debug!(path = %bc_dir.display(), "No configuration directory, using defaults");
        return Ok(ControlConfig::default());
    }

    let settings = load_settings(&bc_dir)?;
    let recipes = load_recipes(&bc_dir)?;

    Ok(ControlConfig { settings, recipes })
}

/// Loads controller settings from `config.toml`.
fn load_settings(bc_dir: &Path) -> ConfigResult<ControlSettings> {
    let config_path = bc_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(ControlSettings::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let settings: ControlSettings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    if settings.max_chart_path_len == 0 {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "max_chart_path_len must be greater than zero".to_string(),
        });
    }

    Ok(settings)
}

/// Loads all recipe files from `recipes/`, ordered by file name.
fn load_recipes(bc_dir: &Path) -> ConfigResult<Vec<RecipeFile>> {
    let recipes_dir = bc_dir.join("recipes");

    if !recipes_dir.exists() {
        return Ok(Vec::new());
    }

    let mut recipes = Vec::new();

    for entry in WalkDir::new(&recipes_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: recipes_dir.clone(),
            source,
        })?;

        let path = entry.path();

        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let recipe: RecipeFile =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?;

        if recipe.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: "Recipe name is empty".to_string(),
            });
        }

        debug!(path = %path.display(), recipe = %recipe.name, "Loaded recipe file");
        recipes.push(recipe);
    }

    Ok(recipes)
}
