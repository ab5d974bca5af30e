//! Cookbook Core Library
//!
//! Entity models shared by the cookbook server and CLI, together with the
//! [`Entity`] abstraction the storage and service layers are generic over.

pub mod entity;
pub mod error;
pub mod models;

pub use entity::{Entity, EntityPatch};
pub use error::{CookingParseError, ValidationError};
pub use models::{
    Cooking, Ingredient, IngredientPatch, Recipe, RecipePatch, RecipeRef, Step, StepPatch,
    Technique, TechniquePatch,
};
