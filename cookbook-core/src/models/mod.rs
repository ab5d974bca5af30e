mod cooking;
mod ingredient;
mod picture;
mod recipe;
mod step;
mod technique;

pub use cooking::Cooking;
pub use ingredient::{Ingredient, IngredientPatch};
pub use recipe::{Recipe, RecipePatch, RecipeRef};
pub use step::{Step, StepPatch};
pub use technique::{Technique, TechniquePatch};

/// Lowercased, space-joined search text from the non-empty parts.
pub(crate) fn search_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
