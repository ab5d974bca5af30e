//! Storage for the single-column catalog entities a recipe links to.

use async_trait::async_trait;
use cookbook_core::{Entity, Ingredient, RecipeRef, Step};
use sqlx::SqlitePool;
use std::marker::PhantomData;

use super::links::{LinkTable, RECIPE_INGREDIENTS, RECIPE_STEPS};
use super::{DbError, EntityStore, PageRequest};

/// An entity stored as `(id, <column>)` and linked from recipes through
/// [`CatalogItem::LINKS`]. The table is named after [`Entity::NAME`].
pub trait CatalogItem: Entity<Id = i64> {
    const COLUMN: &'static str;
    const LINKS: LinkTable;

    fn from_row(id: i64, value: String) -> Self;

    fn value(&self) -> &str;

    fn set_recipes(&mut self, recipes: Vec<RecipeRef>);
}

impl CatalogItem for Ingredient {
    const COLUMN: &'static str = "name";
    const LINKS: LinkTable = RECIPE_INGREDIENTS;

    fn from_row(id: i64, name: String) -> Self {
        Ingredient {
            id: Some(id),
            name,
            recipes: Vec::new(),
        }
    }

    fn value(&self) -> &str {
        &self.name
    }

    fn set_recipes(&mut self, recipes: Vec<RecipeRef>) {
        self.recipes = recipes;
    }
}

impl CatalogItem for Step {
    const COLUMN: &'static str = "action";
    const LINKS: LinkTable = RECIPE_STEPS;

    fn from_row(id: i64, action: String) -> Self {
        Step {
            id: Some(id),
            action,
            recipes: Vec::new(),
        }
    }

    fn value(&self) -> &str {
        &self.action
    }

    fn set_recipes(&mut self, recipes: Vec<RecipeRef>) {
        self.recipes = recipes;
    }
}

pub struct CatalogRepository<E> {
    pool: SqlitePool,
    _item: PhantomData<fn() -> E>,
}

pub type IngredientRepository = CatalogRepository<Ingredient>;
pub type StepRepository = CatalogRepository<Step>;

impl<E: CatalogItem> CatalogRepository<E> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<E: CatalogItem> EntityStore for CatalogRepository<E> {
    type Entity = E;

    async fn insert(&self, item: &E) -> Result<E, DbError> {
        let insert = format!("INSERT INTO {} ({}) VALUES (?)", E::NAME, E::COLUMN);
        let result = sqlx::query(&insert)
            .bind(item.value())
            .execute(&self.pool)
            .await?;

        Ok(E::from_row(result.last_insert_rowid(), item.value().to_string()))
    }

    async fn update(&self, item: &E) -> Result<u64, DbError> {
        let id = *item
            .id()
            .ok_or_else(|| DbError::not_found(E::NAME, "<unsaved>"))?;

        let update = format!("UPDATE {} SET {} = ? WHERE id = ?", E::NAME, E::COLUMN);
        let result = sqlx::query(&update)
            .bind(item.value())
            .bind(id)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(DbError::not_found(E::NAME, id)),
            n => Ok(n),
        }
    }

    async fn find_by_id(&self, id: &i64) -> Result<Option<E>, DbError> {
        let select = format!("SELECT id, {} FROM {} WHERE id = ?", E::COLUMN, E::NAME);
        let row: Option<(i64, String)> = sqlx::query_as(&select)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, value)| E::from_row(id, value)))
    }

    async fn find_all(&self, page: Option<PageRequest>) -> Result<Vec<E>, DbError> {
        let (limit, offset) = PageRequest::limit_offset(page);

        let select = format!(
            "SELECT id, {} FROM {} ORDER BY id LIMIT ? OFFSET ?",
            E::COLUMN,
            E::NAME
        );
        let rows: Vec<(i64, String)> = sqlx::query_as(&select)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, value)| E::from_row(id, value))
            .collect())
    }

    async fn exists_by_id(&self, id: &i64) -> Result<bool, DbError> {
        let select = format!("SELECT id FROM {} WHERE id = ?", E::NAME);
        let found: Option<(i64,)> = sqlx::query_as(&select)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn delete_by_id(&self, id: &i64) -> Result<(), DbError> {
        let delete = format!("DELETE FROM {} WHERE id = ?", E::NAME);
        let result = sqlx::query(&delete).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(E::NAME, id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, DbError> {
        let select = format!("SELECT COUNT(*) FROM {}", E::NAME);
        let (count,): (i64,) = sqlx::query_as(&select).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Also reconstructs the recipes linking to this item.
    async fn find_by_id_with_relations(&self, id: &i64) -> Result<Option<E>, DbError> {
        let Some(mut item) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        item.set_recipes(E::LINKS.owners_of(&self.pool, *id).await?);
        Ok(Some(item))
    }
}
