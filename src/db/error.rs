use cookbook_core::CookingParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The caller supplied an ID that should exist but doesn't.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A stored value has no counterpart in the entity's type.
    #[error("Invalid stored value: {0}")]
    Mapping(#[from] CookingParseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
