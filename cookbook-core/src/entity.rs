//! The contract every persisted entity type fulfils.
//!
//! Storage, search mirroring and the REST layer are written once against
//! [`Entity`]; each model only describes its identity, validation rules,
//! partial-update merge and searchable text.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};

use crate::error::ValidationError;

pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Store-assigned identity.
    type Id: Clone
        + Debug
        + Display
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Merge-patch body for partial updates.
    type Patch: EntityPatch<Self>;

    /// Singular name, also the table and search index name.
    const NAME: &'static str;

    /// Collection name used in REST paths.
    const PLURAL: &'static str;

    fn id(&self) -> Option<&Self::Id>;

    fn set_id(&mut self, id: Self::Id);

    /// Checks field-level rules. Identity rules are enforced by the service.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Free text the search index matches queries against.
    fn search_text(&self) -> String;

    /// The document mirrored into the search index.
    fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// A partial update where every field is optional.
///
/// Absent (or `null`) fields leave the target untouched.
pub trait EntityPatch<E: Entity>: DeserializeOwned + Debug + Send + 'static {
    fn id(&self) -> Option<&E::Id>;

    fn apply(self, target: &mut E);
}
