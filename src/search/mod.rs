//! Search Indexer Adapter: a best-effort mirror of entity writes.
//!
//! The index is an explicit dependency of the service layer. Nothing here
//! is kept consistent with the primary store beyond "written after it".

mod memory;
mod sqlite;

pub use memory::MemorySearchIndex;
pub use sqlite::SqliteSearchIndex;

use async_trait::async_trait;
use cookbook_core::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Cannot index a {0} without an ID")]
    MissingId(&'static str),

    #[error("Invalid search document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Document storage keyed by `(index, id)`, queried by free text.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Inserts or replaces a document. `text` is what queries match against.
    async fn save(&self, index: &str, id: &str, document: &Value, text: &str)
        -> Result<(), SearchError>;

    /// Removing an absent document is not an error.
    async fn delete(&self, index: &str, id: &str) -> Result<(), SearchError>;

    /// Documents whose text contains every query term, ordered by ID.
    async fn search(&self, index: &str, query: &str) -> Result<Vec<Value>, SearchError>;
}

/// Which [`SearchIndex`] implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    Sqlite,
    Memory,
}

impl std::str::FromStr for SearchBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(SearchBackend::Sqlite),
            "memory" => Ok(SearchBackend::Memory),
            other => Err(format!(
                "Invalid search backend '{}'. Valid options: sqlite, memory",
                other
            )),
        }
    }
}

impl std::fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchBackend::Sqlite => write!(f, "sqlite"),
            SearchBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Opens the configured backend. `path` is only used by the SQLite index.
pub async fn open(backend: SearchBackend, path: &Path) -> Result<Arc<dyn SearchIndex>, SearchError> {
    match backend {
        SearchBackend::Sqlite => Ok(Arc::new(SqliteSearchIndex::open(path).await?)),
        SearchBackend::Memory => Ok(Arc::new(MemorySearchIndex::new())),
    }
}

/// Lowercased query terms; `None` means the query matches every document.
pub(crate) fn query_terms(query: &str) -> Option<Vec<String>> {
    let query = query.trim();
    if query.is_empty() || query == "*" {
        return None;
    }
    Some(query.split_whitespace().map(str::to_lowercase).collect())
}

/// The index of one entity type, named after [`Entity::NAME`].
pub struct EntityIndex<E> {
    inner: Arc<dyn SearchIndex>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityIndex<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityIndex<E> {
    pub fn new(inner: Arc<dyn SearchIndex>) -> Self {
        Self {
            inner,
            _entity: PhantomData,
        }
    }

    /// Mirrors `entity` and returns it as the index now holds it.
    pub async fn save(&self, entity: &E) -> Result<E, SearchError> {
        let id = entity.id().ok_or(SearchError::MissingId(E::NAME))?;
        let document = entity.to_document()?;
        self.inner
            .save(E::NAME, &id.to_string(), &document, &entity.search_text())
            .await?;
        Ok(serde_json::from_value(document)?)
    }

    pub async fn delete_by_id(&self, id: &E::Id) -> Result<(), SearchError> {
        self.inner.delete(E::NAME, &id.to_string()).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<E>, SearchError> {
        let documents = self.inner.search(E::NAME, query).await?;
        documents
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(SearchError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookbook_core::{Cooking, Ingredient, Recipe, Technique};

    #[test]
    fn test_query_terms() {
        assert_eq!(query_terms("*"), None);
        assert_eq!(query_terms("   "), None);
        assert_eq!(
            query_terms(" Tomato  SOUP "),
            Some(vec!["tomato".to_string(), "soup".to_string()])
        );
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("SQLite".parse::<SearchBackend>(), Ok(SearchBackend::Sqlite));
        assert_eq!("memory".parse::<SearchBackend>(), Ok(SearchBackend::Memory));
        assert!("elastic".parse::<SearchBackend>().is_err());
    }

    #[tokio::test]
    async fn test_entity_index_round_trip_without_picture() {
        let index: EntityIndex<Recipe> = EntityIndex::new(Arc::new(MemorySearchIndex::new()));

        let mut recipe = Recipe::new("Gazpacho", Cooking::WithoutCooking)
            .with_picture(vec![1, 2, 3], "image/png")
            .with_ingredients(vec![Ingredient::reference(4)]);
        recipe.id = Some(9);
        let indexed = index.save(&recipe).await.unwrap();
        assert_eq!(indexed.name, "Gazpacho");
        assert_eq!(indexed.picture, None);

        let found = index.search("gazpacho").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, Some(9));
        assert_eq!(found[0].picture, None);
        assert_eq!(found[0].ingredients.len(), 1);

        index.delete_by_id(&9).await.unwrap();
        assert!(index.search("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entity_index_requires_id() {
        let index: EntityIndex<Technique> = EntityIndex::new(Arc::new(MemorySearchIndex::new()));

        let err = index.save(&Technique::new("Sous vide")).await.unwrap_err();
        assert!(matches!(err, SearchError::MissingId("technique")));
    }
}
