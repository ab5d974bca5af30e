//! Model-level error types.

use thiserror::Error;

/// A stored or supplied cooking method that is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid cooking method '{0}'. Valid options: WITH_COOKING, WITHOUT_COOKING")]
pub struct CookingParseError(pub String);

/// A client error on an entity: bad identity or a field outside its domain.
///
/// `code` is the short machine-readable key (`idexists`, `idnull`, ...)
/// returned to callers next to the entity name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub entity: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(entity: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            entity,
            code,
            message: message.into(),
        }
    }

    pub fn id_exists(entity: &'static str) -> Self {
        Self::new(
            entity,
            "idexists",
            format!("A new {} cannot already have an ID", entity),
        )
    }

    pub fn id_null(entity: &'static str) -> Self {
        Self::new(entity, "idnull", "Invalid id")
    }

    pub fn id_invalid(entity: &'static str) -> Self {
        Self::new(entity, "idinvalid", "Invalid ID")
    }

    pub fn id_not_found(entity: &'static str) -> Self {
        Self::new(entity, "idnotfound", "Entity not found")
    }
}
