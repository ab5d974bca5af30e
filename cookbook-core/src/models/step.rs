use serde::{Deserialize, Serialize};
use std::fmt;

use super::recipe::RecipeRef;
use crate::entity::{Entity, EntityPatch};
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: Option<i64>,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipes: Vec<RecipeRef>,
}

impl Step {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            id: None,
            action: action.into(),
            recipes: Vec::new(),
        }
    }

    pub fn reference(id: i64) -> Self {
        Self {
            id: Some(id),
            action: String::new(),
            recipes: Vec::new(),
        }
    }
}

impl Entity for Step {
    type Id = i64;
    type Patch = StepPatch;

    const NAME: &'static str = "step";
    const PLURAL: &'static str = "steps";

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.action.trim().is_empty() {
            return Err(ValidationError::new(
                Self::NAME,
                "actionrequired",
                "Step action must not be blank",
            ));
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        super::search_text([self.action.as_str()])
    }

    fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(Step {
            recipes: Vec::new(),
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepPatch {
    pub id: Option<i64>,
    pub action: Option<String>,
}

impl EntityPatch<Step> for StepPatch {
    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn apply(self, target: &mut Step) {
        if let Some(action) = self.action {
            target.action = action;
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{} (#{})", self.action, id),
            None => write!(f, "{}", self.action),
        }
    }
}
