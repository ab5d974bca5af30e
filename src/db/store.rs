//! The Entity Store Adapter contract.

use async_trait::async_trait;
use cookbook_core::Entity;
use serde::Deserialize;

use super::DbError;

pub type EntityId<S> = <<S as EntityStore>::Entity as Entity>::Id;

/// Zero-based page selection for list reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// `LIMIT`/`OFFSET` values; no page means every row (`LIMIT -1`).
    ///
    /// An offset past `i64::MAX` saturates, which selects no rows.
    pub fn limit_offset(page: Option<PageRequest>) -> (i64, i64) {
        match page {
            Some(p) => {
                let size = i64::from(p.size);
                (size, size.saturating_mul(i64::from(p.page)))
            }
            None => (-1, 0),
        }
    }
}

/// CRUD statements against the primary store for one entity type.
///
/// The relation hooks default to no-ops; only aggregate roots override them.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    type Entity: Entity;

    /// Persists a new row and returns the entity with its assigned ID.
    async fn insert(&self, entity: &Self::Entity) -> Result<Self::Entity, DbError>;

    /// Replaces every column of an existing row. Fails with
    /// [`DbError::NotFound`] when no row was affected.
    async fn update(&self, entity: &Self::Entity) -> Result<u64, DbError>;

    async fn find_by_id(&self, id: &EntityId<Self>) -> Result<Option<Self::Entity>, DbError>;

    /// Rows ordered by ID.
    async fn find_all(&self, page: Option<PageRequest>) -> Result<Vec<Self::Entity>, DbError>;

    async fn exists_by_id(&self, id: &EntityId<Self>) -> Result<bool, DbError>;

    /// Fails with [`DbError::NotFound`] when the row did not exist.
    async fn delete_by_id(&self, id: &EntityId<Self>) -> Result<(), DbError>;

    async fn count(&self) -> Result<i64, DbError>;

    async fn find_by_id_with_relations(
        &self,
        id: &EntityId<Self>,
    ) -> Result<Option<Self::Entity>, DbError> {
        self.find_by_id(id).await
    }

    async fn find_all_with_relations(
        &self,
        page: Option<PageRequest>,
    ) -> Result<Vec<Self::Entity>, DbError> {
        self.find_all(page).await
    }

    /// Makes the persisted links of `entity` match its in-memory relations.
    async fn sync_relations(&self, _entity: &Self::Entity) -> Result<(), DbError> {
        Ok(())
    }

    /// Removes every link owned by `id`; runs before the row is deleted.
    async fn unlink_relations(&self, _id: &EntityId<Self>) -> Result<(), DbError> {
        Ok(())
    }
}
