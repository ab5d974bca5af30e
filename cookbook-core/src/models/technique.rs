use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Entity, EntityPatch};
use crate::error::ValidationError;

/// A standalone cooking technique, keyed by a store-generated string ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub id: Option<String>,
    pub description: String,
}

impl Technique {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: None,
            description: description.into(),
        }
    }
}

impl Entity for Technique {
    type Id = String;
    type Patch = TechniquePatch;

    const NAME: &'static str = "technique";
    const PLURAL: &'static str = "techniques";

    fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::new(
                Self::NAME,
                "descriptionrequired",
                "Technique description must not be blank",
            ));
        }
        Ok(())
    }

    fn search_text(&self) -> String {
        super::search_text([self.description.as_str()])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechniquePatch {
    pub id: Option<String>,
    pub description: Option<String>,
}

impl EntityPatch<Technique> for TechniquePatch {
    fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    fn apply(self, target: &mut Technique) {
        if let Some(description) = self.description {
            target.description = description;
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({})", self.description, id),
            None => write!(f, "{}", self.description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_identity() {
        let mut technique = Technique::new("Blanching");
        assert_eq!(technique.id(), None);
        technique.set_id("abc".to_string());
        assert_eq!(technique.id().map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_json_roundtrip_keeps_string_id() {
        let technique = Technique {
            id: Some("f3a1".to_string()),
            description: "Braising".to_string(),
        };
        let json = serde_json::to_string(&technique).unwrap();
        assert_eq!(json, r#"{"id":"f3a1","description":"Braising"}"#);
    }
}
