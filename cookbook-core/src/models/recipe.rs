use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::cooking::Cooking;
use super::ingredient::Ingredient;
use super::step::Step;
use crate::entity::{Entity, EntityPatch};
use crate::error::ValidationError;

/// Upper bound of `cooking_time`, in minutes.
pub const MAX_COOKING_TIME: f64 = 65535.0;

/// The aggregate root: owns the ingredient and step relations.
///
/// Relations are held as values. Only their IDs are persisted (through the
/// recipe's link tables); names and actions are filled in on eager reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Option<i64>,
    pub name: String,
    pub cooking: Cooking,
    pub cooking_time: Option<f64>, // minutes
    #[serde(default, with = "super::picture")]
    pub picture: Option<Vec<u8>>,
    pub picture_content_type: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// ID and name of a recipe, as seen from the inverse side of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRef {
    pub id: i64,
    pub name: String,
}

impl Recipe {
    pub fn new(name: impl Into<String>, cooking: Cooking) -> Self {
        Self {
            id: None,
            name: name.into(),
            cooking,
            cooking_time: None,
            picture: None,
            picture_content_type: None,
            ingredients: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_cooking_time(mut self, minutes: f64) -> Self {
        self.cooking_time = Some(minutes);
        self
    }

    pub fn with_picture(mut self, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.picture = Some(bytes);
        self.picture_content_type = Some(content_type.into());
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients.clear();
        for ingredient in ingredients {
            self.add_ingredient(ingredient);
        }
        self
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps.clear();
        for step in steps {
            self.add_step(step);
        }
        self
    }

    /// Adds an ingredient unless one with the same ID is already present.
    pub fn add_ingredient(&mut self, ingredient: Ingredient) -> bool {
        if ingredient.id.is_some() && self.ingredients.iter().any(|i| i.id == ingredient.id) {
            return false;
        }
        self.ingredients.push(Ingredient {
            recipes: Vec::new(),
            ..ingredient
        });
        true
    }

    pub fn remove_ingredient(&mut self, ingredient_id: i64) -> bool {
        let before = self.ingredients.len();
        self.ingredients.retain(|i| i.id != Some(ingredient_id));
        self.ingredients.len() != before
    }

    /// Adds a step unless one with the same ID is already present.
    pub fn add_step(&mut self, step: Step) -> bool {
        if step.id.is_some() && self.steps.iter().any(|s| s.id == step.id) {
            return false;
        }
        self.steps.push(Step {
            recipes: Vec::new(),
            ..step
        });
        true
    }

    pub fn remove_step(&mut self, step_id: i64) -> bool {
        let before = self.steps.len();
        self.steps.retain(|s| s.id != Some(step_id));
        self.steps.len() != before
    }

    /// Target set for the ingredient link table.
    pub fn ingredient_ids(&self) -> BTreeSet<i64> {
        self.ingredients.iter().filter_map(|i| i.id).collect()
    }

    /// Target set for the step link table.
    pub fn step_ids(&self) -> BTreeSet<i64> {
        self.steps.iter().filter_map(|s| s.id).collect()
    }
}

impl Entity for Recipe {
    type Id = i64;
    type Patch = RecipePatch;

    const NAME: &'static str = "recipe";
    const PLURAL: &'static str = "recipes";

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new(
                Self::NAME,
                "namerequired",
                "Recipe name must not be blank",
            ));
        }
        if let Some(minutes) = self.cooking_time {
            if !(0.0..=MAX_COOKING_TIME).contains(&minutes) {
                return Err(ValidationError::new(
                    Self::NAME,
                    "cookingtimerange",
                    format!(
                        "Cooking time must be between 0 and {}, got {}",
                        MAX_COOKING_TIME, minutes
                    ),
                ));
            }
        }
        let unsaved_relation = self.ingredients.iter().any(|i| i.id.is_none())
            || self.steps.iter().any(|s| s.id.is_none());
        if unsaved_relation {
            return Err(ValidationError::new(
                Self::NAME,
                "relationidnull",
                "Related ingredients and steps must be saved before linking",
            ));
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        let cooking_time = self.cooking_time.map(|t| t.to_string()).unwrap_or_default();
        super::search_text(
            [self.name.as_str(), self.cooking.as_str(), cooking_time.as_str()]
                .into_iter()
                .chain(self.ingredients.iter().map(|i| i.name.as_str()))
                .chain(self.steps.iter().map(|s| s.action.as_str())),
        )
    }

    fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut document = serde_json::to_value(self)?;
        if let Some(fields) = document.as_object_mut() {
            fields.remove("picture");
        }
        Ok(document)
    }
}

/// Merge-patch body for a recipe.
///
/// Relations are not patchable; `ingredients` and `steps` in the body are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePatch {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub cooking: Option<Cooking>,
    pub cooking_time: Option<f64>,
    #[serde(default, with = "super::picture")]
    pub picture: Option<Vec<u8>>,
    pub picture_content_type: Option<String>,
}

impl EntityPatch<Recipe> for RecipePatch {
    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn apply(self, target: &mut Recipe) {
        if let Some(name) = self.name {
            target.name = name;
        }
        if let Some(cooking) = self.cooking {
            target.cooking = cooking;
        }
        if let Some(cooking_time) = self.cooking_time {
            target.cooking_time = Some(cooking_time);
        }
        if let Some(picture) = self.picture {
            target.picture = Some(picture);
        }
        if let Some(content_type) = self.picture_content_type {
            target.picture_content_type = Some(content_type);
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => writeln!(f, "{} (#{})", self.name, id)?,
            None => writeln!(f, "{}", self.name)?,
        }
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Cooking: {}", self.cooking)?;

        if let Some(minutes) = self.cooking_time {
            writeln!(f, "Time: {} min", minutes)?;
        }
        if let Some(content_type) = &self.picture_content_type {
            let size = self.picture.as_ref().map_or(0, Vec::len);
            writeln!(f, "Picture: {} ({} bytes)", content_type, size)?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.steps.is_empty() {
            writeln!(f, "\nSteps:")?;
            for step in &self.steps {
                writeln!(f, "  - {}", step)?;
            }
        }

        Ok(())
    }
}
