//! Recipe definition models.
//!
//! Recipes are versioned templates describing how to produce a batch. They
//! are created through the recipe manager or loaded from
//! `.batch-control/recipes/*.yaml`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Version used when a recipe is created without an explicit version.
pub const DEFAULT_RECIPE_VERSION: &str = "1.0";

/// A material consumed by a recipe.
///
/// Templates may list an ingredient as a bare name (`"Water"`) or as an
/// object. A `quantity` given as text is parsed; unparseable text counts as
/// no quantity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "IngredientEntry")]
pub struct Ingredient {
    pub name: String,

    #[serde(default)]
    pub quantity: f64,

    /// Unit of `quantity`, e.g. `kg` or `L`. Empty when unspecified.
    #[serde(default)]
    pub unit: String,
}

/// A single step of a recipe procedure.
///
/// Like ingredients, a step may be a bare name. In object form the name may
/// also be given as `step`; a step with no name at all is named after its
/// position (`step_1`, `step_2`, ...).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "StepEntry")]
pub struct RecipeStep {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Nominal duration of the step, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,

    /// Setpoints and other step parameters.
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

/// The content sections of a recipe.
///
/// This is the shape of a recipe template: `ingredients` and `steps` are
/// required (they may be empty), the parameter maps are optional.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeContent {
    pub ingredients: Vec<Ingredient>,

    #[serde(deserialize_with = "named_steps")]
    pub steps: Vec<RecipeStep>,

    #[serde(default)]
    pub quality_parameters: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub equipment_requirements: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub safety_parameters: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IngredientEntry {
    Name(String),
    Detailed {
        #[serde(default)]
        name: String,
        #[serde(default, deserialize_with = "lenient_f64")]
        quantity: Option<f64>,
        #[serde(default)]
        unit: String,
    },
}

impl From<IngredientEntry> for Ingredient {
    fn from(entry: IngredientEntry) -> Self {
        match entry {
            IngredientEntry::Name(name) => Self {
                name,
                quantity: 0.0,
                unit: String::new(),
            },
            IngredientEntry::Detailed {
                name,
                quantity,
                unit,
            } => Self {
                name,
                quantity: quantity.unwrap_or_default(),
                unit,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepEntry {
    Name(String),
    Detailed {
        #[serde(default, alias = "step")]
        name: String,
        #[serde(default)]
        description: String,
        #[serde(default, deserialize_with = "lenient_f64")]
        duration_minutes: Option<f64>,
        #[serde(default)]
        parameters: HashMap<String, serde_json::Value>,
    },
}

impl From<StepEntry> for RecipeStep {
    fn from(entry: StepEntry) -> Self {
        match entry {
            StepEntry::Name(name) => Self {
                name,
                description: String::new(),
                duration_minutes: None,
                parameters: HashMap::new(),
            },
            StepEntry::Detailed {
                name,
                description,
                duration_minutes,
                parameters,
            } => Self {
                name,
                description,
                duration_minutes,
                parameters,
            },
        }
    }
}

/// A number that may arrive as text, e.g. `"10"` from a form field.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LenientNumber>::deserialize(deserializer)?.and_then(|number| match number {
        LenientNumber::Number(n) => Some(n),
        LenientNumber::Text(text) => text.trim().parse().ok(),
    });
    Ok(value.filter(|n: &f64| n.is_finite()))
}

fn named_steps<'de, D>(deserializer: D) -> Result<Vec<RecipeStep>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut steps = Vec::<RecipeStep>::deserialize(deserializer)?;
    for (index, step) in steps.iter_mut().enumerate() {
        if step.name.trim().is_empty() {
            step.name = format!("step_{}", index + 1);
        }
    }
    Ok(steps)
}

/// A stored recipe revision.
///
/// `recipe_id` is unique. Several revisions may share a `name`, and even
/// a `(name, version)` pair.
///
/// # Example
///
/// ```yaml
/// name: Batch A
/// version: "2.1"
/// description: Standard fill
/// ingredients:
///   - name: Water
///     quantity: 120
///     unit: L
/// steps:
///   - name: Charge
///   - name: Mix
///     duration_minutes: 15
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeDefinition {
    pub recipe_id: String,

    pub name: String,

    pub version: String,

    #[serde(default)]
    pub description: String,

    pub created_date: DateTime<Utc>,

    pub modified_date: DateTime<Utc>,

    #[serde(flatten)]
    pub content: RecipeContent,
}

impl RecipeDefinition {
    /// Name of the first declared step, if any.
    pub fn first_step(&self) -> Option<&str> {
        self.content.steps.first().map(|step| step.name.as_str())
    }

    /// Sum of the declared step durations. `None` if any step has no duration.
    pub fn nominal_duration_minutes(&self) -> Option<f64> {
        self.content
            .steps
            .iter()
            .map(|step| step.duration_minutes)
            .sum()
    }
}

/// A recipe as written in a `.batch-control/recipes/*.yaml` file.
///
/// Identity and timestamps are assigned when the file is imported.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeFile {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: String,

    #[serde(flatten)]
    pub content: RecipeContent,
}

fn default_version() -> String {
    DEFAULT_RECIPE_VERSION.to_string()
}
