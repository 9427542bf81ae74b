//! Recipe template validation and identifier generation.

use crate::error::{ControlError, ControlResult};
use bc_protocol::{RecipeContent, RecipeFile};
use serde_json::Value;
use uuid::Uuid;

/// Version selector meaning "most recently created revision".
pub const LATEST: &str = "latest";

const TEMPLATE_SECTIONS: [&str; 2] = ["ingredients", "steps"];
const RECIPE_FIELDS: [&str; 4] = ["name", "version", "ingredients", "steps"];

/// Check a recipe name, equipment id or similar free-form business key.
pub fn validate_key(kind: &str, key: &str) -> ControlResult<()> {
    if key.trim().is_empty() {
        return Err(ControlError::InvalidKey {
            key: key.to_string(),
            reason: format!("{kind} is empty"),
        });
    }
    Ok(())
}

/// Check a version string. `latest` is reserved for lookups.
pub fn validate_version(version: &str) -> ControlResult<()> {
    validate_key("version", version)?;
    if version == LATEST {
        return Err(ControlError::InvalidKey {
            key: version.to_string(),
            reason: format!("{LATEST:?} is reserved"),
        });
    }
    Ok(())
}

/// Parse a recipe template.
///
/// The template must be an object declaring both `ingredients` and `steps`
/// (either may be empty). Parameter maps are optional.
pub fn parse_template(template: &Value) -> ControlResult<RecipeContent> {
    require_fields(template, &TEMPLATE_SECTIONS)?;
    serde_json::from_value(template.clone())
        .map_err(|e| ControlError::InvalidTemplate(format!("Malformed template: {e}")))
}

/// Parse full recipe data for a save.
///
/// Requires `name`, `version`, `ingredients` and `steps`, and the embedded
/// name must match `name`.
pub fn parse_recipe_data(name: &str, data: &Value) -> ControlResult<RecipeFile> {
    require_fields(data, &RECIPE_FIELDS)?;
    let recipe: RecipeFile = serde_json::from_value(data.clone())
        .map_err(|e| ControlError::InvalidTemplate(format!("Malformed recipe data: {e}")))?;

    if recipe.name != name {
        return Err(ControlError::InvalidTemplate(format!(
            "Recipe data names {:?}, expected {name:?}",
            recipe.name
        )));
    }
    validate_version(&recipe.version)?;
    Ok(recipe)
}

/// Generate a recipe id from name, version and a random suffix, e.g.
/// `batch_a_1_0_3f9c2b1e`.
pub fn generate_recipe_id(name: &str, version: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", slug(name), slug(version), &suffix[..8])
}

fn require_fields(value: &Value, fields: &[&str]) -> ControlResult<()> {
    let object = value
        .as_object()
        .ok_or_else(|| ControlError::InvalidTemplate("Template is not an object".to_string()))?;

    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(ControlError::InvalidTemplate(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

fn slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}
