//! Versioned recipe storage.
//!
//! Recipes are keyed by `recipe_id`. Several revisions may share a name
//! (and even a version); lookups by name pick the most recently created
//! revision, breaking `created_date` ties by insertion order (later wins).

use crate::error::{ControlError, ControlResult};
use crate::recipes::validation::generate_recipe_id;
use bc_protocol::{RecipeDefinition, RecipeFile};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

struct StoredRecipe {
    /// Insertion order, used to break created_date ties.
    seq: u64,
    definition: RecipeDefinition,
}

impl StoredRecipe {
    fn recency(&self) -> (DateTime<Utc>, u64) {
        (self.definition.created_date, self.seq)
    }
}

#[derive(Default)]
struct Inner {
    recipes: HashMap<String, StoredRecipe>,
    next_seq: u64,
}

impl Inner {
    fn push(&mut self, definition: RecipeDefinition) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.recipes
            .insert(definition.recipe_id.clone(), StoredRecipe { seq, definition });
    }

    fn latest_mut(&mut self, name: &str) -> Option<&mut StoredRecipe> {
        self.recipes
            .values_mut()
            .filter(|stored| stored.definition.name == name)
            .max_by_key(|stored| stored.recency())
    }
}

/// In-memory store of recipe definitions.
///
/// Readers share the lock; a save holds the write guard across its
/// existence check and its write, so two saves of one name cannot both
/// succeed without `overwrite`.
#[derive(Default)]
pub struct RecipeStore {
    inner: RwLock<Inner>,
}

impl RecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new revision. Fails if the id is already taken.
    pub fn insert(&self, definition: RecipeDefinition) -> ControlResult<()> {
        let mut inner = self.inner.write();
        if inner.recipes.contains_key(&definition.recipe_id) {
            return Err(ControlError::AlreadyExists(format!(
                "Recipe id {}",
                definition.recipe_id
            )));
        }
        inner.push(definition);
        Ok(())
    }

    /// Most recently created revision named `name`.
    pub fn latest(&self, name: &str) -> Option<RecipeDefinition> {
        let inner = self.inner.read();
        inner
            .recipes
            .values()
            .filter(|stored| stored.definition.name == name)
            .max_by_key(|stored| stored.recency())
            .map(|stored| stored.definition.clone())
    }

    /// Most recently created revision with this exact name and version.
    pub fn find(&self, name: &str, version: &str) -> Option<RecipeDefinition> {
        let inner = self.inner.read();
        inner
            .recipes
            .values()
            .filter(|stored| stored.definition.name == name && stored.definition.version == version)
            .max_by_key(|stored| stored.recency())
            .map(|stored| stored.definition.clone())
    }

    pub fn get(&self, recipe_id: &str) -> Option<RecipeDefinition> {
        self.inner
            .read()
            .recipes
            .get(recipe_id)
            .map(|stored| stored.definition.clone())
    }

    /// Save `recipe` under its name.
    ///
    /// When a revision with that name exists, fails unless `overwrite` is
    /// set, in which case the latest revision is replaced in place: its id
    /// and created_date are kept and modified_date becomes `now`. Otherwise
    /// a new revision is created.
    pub fn save(
        &self,
        recipe: RecipeFile,
        overwrite: bool,
        now: DateTime<Utc>,
    ) -> ControlResult<RecipeDefinition> {
        let mut inner = self.inner.write();

        if let Some(existing) = inner.latest_mut(&recipe.name) {
            if !overwrite {
                return Err(ControlError::AlreadyExists(format!("Recipe {}", recipe.name)));
            }
            let definition = &mut existing.definition;
            definition.version = recipe.version;
            definition.description = recipe.description;
            definition.content = recipe.content;
            definition.modified_date = now;
            return Ok(definition.clone());
        }

        let definition = RecipeDefinition {
            recipe_id: generate_recipe_id(&recipe.name, &recipe.version),
            name: recipe.name,
            version: recipe.version,
            description: recipe.description,
            created_date: now,
            modified_date: now,
            content: recipe.content,
        };
        inner.push(definition.clone());
        Ok(definition)
    }

    /// All revisions, newest first.
    pub fn list(&self) -> Vec<RecipeDefinition> {
        let inner = self.inner.read();
        let mut stored: Vec<&StoredRecipe> = inner.recipes.values().collect();
        stored.sort_by_key(|stored| std::cmp::Reverse(stored.recency()));
        stored
            .into_iter()
            .map(|stored| stored.definition.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
