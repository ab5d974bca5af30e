use serde::{Deserialize, Serialize};
use std::fmt;

use super::recipe::RecipeRef;
use crate::entity::{Entity, EntityPatch};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Option<i64>,
    /// Defaults to empty so a recipe body may reference an ingredient by ID only.
    #[serde(default)]
    pub name: String,
    /// Inverse side of the recipe relation, filled by query on reads and
    /// never written.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipes: Vec<RecipeRef>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            recipes: Vec::new(),
        }
    }

    /// A reference to a persisted ingredient, for linking into a recipe.
    pub fn reference(id: i64) -> Self {
        Self {
            id: Some(id),
            name: String::new(),
            recipes: Vec::new(),
        }
    }
}

impl Entity for Ingredient {
    type Id = i64;
    type Patch = IngredientPatch;

    const NAME: &'static str = "ingredient";
    const PLURAL: &'static str = "ingredients";

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
                "Ingredient name must not be blank",
            ));
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        super::search_text([self.name.as_str()])
    }

    fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(Ingredient {
            recipes: Vec::new(),
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientPatch {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl EntityPatch<Ingredient> for IngredientPatch {
    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn apply(self, target: &mut Ingredient) {
        if let Some(name) = self.name {
            target.name = name;
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{} (#{})", self.name, id),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_by_id_only() {
        let ingredient: Ingredient = serde_json::from_str(r#"{"id":3}"#).unwrap();
        assert_eq!(ingredient, Ingredient::reference(3));
    }

    #[test]
    fn test_blank_name_is_invalid() {
        assert_eq!(
            Ingredient::new(" ").validate().unwrap_err().code,
            "namerequired"
        );
        assert!(Ingredient::new("Salt").validate().is_ok());
    }

    #[test]
    fn test_document_drops_back_references() {
        let ingredient = Ingredient {
            id: Some(1),
            name: "Salt".to_string(),
            recipes: vec![RecipeRef {
                id: 2,
                name: "Soup".to_string(),
            }],
        };
        let document = ingredient.to_document().unwrap();
        assert!(document.get("recipes").is_none());
        assert_eq!(document["name"], "Salt");
    }

    #[test]
    fn test_patch() {
        let mut ingredient = Ingredient::new("Salt");
        let patch: IngredientPatch = serde_json::from_str(r#"{"id":1}"#).unwrap();
        patch.apply(&mut ingredient);
        assert_eq!(ingredient.name, "Salt");

        let patch: IngredientPatch = serde_json::from_str(r#"{"id":1,"name":"Sea salt"}"#).unwrap();
        patch.apply(&mut ingredient);
        assert_eq!(ingredient.name, "Sea salt");
    }
}
