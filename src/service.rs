//! Entity Service: orchestrates the primary store, relation links and the
//! search mirror for one entity type.
//!
//! A write runs validate, persist row, reconcile links, mirror to index, in
//! that order; a delete runs unlink, delete row, unindex. Nothing is rolled
//! back when a later step fails, the error is returned to the caller.

use cookbook_core::{CookingParseError, Entity, EntityPatch, ValidationError};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::db::{
    self, DbError, EntityId, EntityStore, IngredientRepository, PageRequest, RecipeRepository,
    StepRepository, TechniqueRepository,
};
use crate::search::{self, EntityIndex, SearchBackend, SearchError, SearchIndex};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid stored value: {0}")]
    Mapping(#[from] CookingParseError),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Search index error: {0}")]
    Search(#[from] SearchError),
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            DbError::Mapping(e) => ServiceError::Mapping(e),
            DbError::Sqlx(e) => ServiceError::Store(e),
        }
    }
}

pub struct EntityService<S: EntityStore> {
    store: S,
    index: EntityIndex<S::Entity>,
}

impl<S: EntityStore> EntityService<S> {
    pub fn new(store: S, index: Arc<dyn SearchIndex>) -> Self {
        Self {
            store,
            index: EntityIndex::new(index),
        }
    }

    /// Persists a new entity. A caller-supplied ID is rejected with `idexists`.
    pub async fn create(&self, entity: S::Entity) -> Result<S::Entity, ServiceError> {
        if entity.id().is_some() {
            return Err(ValidationError::id_exists(S::Entity::NAME).into());
        }
        entity.validate()?;

        let saved = self.store.insert(&entity).await?;
        self.store.sync_relations(&saved).await?;

        let saved = self.reload(saved).await?;
        self.mirror(&saved).await?;
        Ok(saved)
    }

    /// Replaces every field of `id` and, for aggregate roots, its links.
    pub async fn full_update(
        &self,
        id: &EntityId<S>,
        entity: S::Entity,
    ) -> Result<S::Entity, ServiceError> {
        self.check_identity(id, entity.id()).await?;
        entity.validate()?;

        self.store.update(&entity).await?;
        self.store.sync_relations(&entity).await?;

        let updated = self.reload(entity).await?;
        self.mirror(&updated).await?;
        Ok(updated)
    }

    /// Merges the fields present in `patch` onto the stored entity.
    ///
    /// Relations are never part of the merge; use a full update to change them.
    pub async fn partial_update(
        &self,
        id: &EntityId<S>,
        patch: <S::Entity as Entity>::Patch,
    ) -> Result<S::Entity, ServiceError> {
        self.check_identity(id, patch.id()).await?;

        let mut current = self
            .store
            .find_by_id_with_relations(id)
            .await?
            .ok_or_else(|| ValidationError::id_not_found(S::Entity::NAME))?;
        patch.apply(&mut current);
        current.validate()?;

        self.store.update(&current).await?;
        self.mirror(&current).await?;
        Ok(current)
    }

    pub async fn find_all(
        &self,
        page: Option<PageRequest>,
        eager: bool,
    ) -> Result<Vec<S::Entity>, ServiceError> {
        let entities = if eager {
            self.store.find_all_with_relations(page).await?
        } else {
            self.store.find_all(page).await?
        };
        Ok(entities)
    }

    /// Reads one entity with its relations populated.
    pub async fn find_by_id(&self, id: &EntityId<S>) -> Result<Option<S::Entity>, ServiceError> {
        Ok(self.store.find_by_id_with_relations(id).await?)
    }

    pub async fn count(&self) -> Result<i64, ServiceError> {
        Ok(self.store.count().await?)
    }

    /// Unlinks, deletes the row, then drops the index document.
    pub async fn delete(&self, id: &EntityId<S>) -> Result<(), ServiceError> {
        self.store.unlink_relations(id).await?;
        self.store.delete_by_id(id).await?;

        if let Err(e) = self.index.delete_by_id(id).await {
            tracing::warn!("{} {} deleted but still indexed: {}", S::Entity::NAME, id, e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Queries the search mirror; results may lag the primary store.
    pub async fn search(&self, query: &str) -> Result<Vec<S::Entity>, ServiceError> {
        Ok(self.index.search(query).await?)
    }

    async fn check_identity(
        &self,
        path_id: &EntityId<S>,
        body_id: Option<&EntityId<S>>,
    ) -> Result<(), ServiceError> {
        let name = S::Entity::NAME;
        match body_id {
            None => Err(ValidationError::id_null(name).into()),
            Some(body_id) if body_id != path_id => Err(ValidationError::id_invalid(name).into()),
            Some(_) => {
                if self.store.exists_by_id(path_id).await? {
                    Ok(())
                } else {
                    Err(ValidationError::id_not_found(name).into())
                }
            }
        }
    }

    /// Re-reads a just-written entity so nested relations carry their fields.
    async fn reload(&self, entity: S::Entity) -> Result<S::Entity, ServiceError> {
        let Some(id) = entity.id() else {
            return Ok(entity);
        };
        Ok(self
            .store
            .find_by_id_with_relations(id)
            .await?
            .unwrap_or(entity))
    }

    async fn mirror(&self, entity: &S::Entity) -> Result<(), ServiceError> {
        match self.index.save(entity).await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!("{} written but not indexed: {}", S::Entity::NAME, e);
                Err(e.into())
            }
        }
    }
}

/// One service per entity type, sharing a pool and a search index.
#[derive(Clone)]
pub struct Services {
    pub recipes: Arc<EntityService<RecipeRepository>>,
    pub ingredients: Arc<EntityService<IngredientRepository>>,
    pub steps: Arc<EntityService<StepRepository>>,
    pub techniques: Arc<EntityService<TechniqueRepository>>,
}

impl Services {
    pub fn new(pool: SqlitePool, index: Arc<dyn SearchIndex>) -> Self {
        Self {
            recipes: Arc::new(EntityService::new(
                RecipeRepository::new(pool.clone()),
                Arc::clone(&index),
            )),
            ingredients: Arc::new(EntityService::new(
                IngredientRepository::new(pool.clone()),
                Arc::clone(&index),
            )),
            steps: Arc::new(EntityService::new(
                StepRepository::new(pool.clone()),
                Arc::clone(&index),
            )),
            techniques: Arc::new(EntityService::new(TechniqueRepository::new(pool), index)),
        }
    }

    /// Opens the primary store and the configured search index.
    pub async fn open(
        database_path: &Path,
        search_backend: SearchBackend,
        search_path: &Path,
    ) -> Result<Self, ServiceError> {
        let pool = db::init_db(database_path).await?;
        let index = search::open(search_backend, search_path).await?;
        Ok(Self::new(pool, index))
    }

    pub async fn from_config(config: &Config) -> Result<Self, ServiceError> {
        Self::open(
            &config.database_path.value,
            config.search.backend.value,
            &config.search.path.value,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::links::{LinkTable, RECIPE_INGREDIENTS, RECIPE_STEPS};
    use crate::db::testing::{test_db, TestDb};
    use crate::search::MemorySearchIndex;
    use async_trait::async_trait;
    use cookbook_core::{
        Cooking, Ingredient, IngredientPatch, Recipe, RecipePatch, Step, Technique,
        TechniquePatch,
    };
    use serde_json::Value;
    use std::collections::BTreeSet;

    /// An index whose every call fails.
    struct BrokenIndex;

    #[async_trait]
    impl SearchIndex for BrokenIndex {
        async fn save(&self, _: &str, _: &str, _: &Value, _: &str) -> Result<(), SearchError> {
            Err(SearchError::Sqlx(sqlx::Error::PoolClosed))
        }

        async fn delete(&self, _: &str, _: &str) -> Result<(), SearchError> {
            Err(SearchError::Sqlx(sqlx::Error::PoolClosed))
        }

        async fn search(&self, _: &str, _: &str) -> Result<Vec<Value>, SearchError> {
            Err(SearchError::Sqlx(sqlx::Error::PoolClosed))
        }
    }

    async fn services() -> (Services, TestDb) {
        let db = test_db().await;
        let services = Services::new(db.pool.clone(), Arc::new(MemorySearchIndex::new()));
        (services, db)
    }

    async fn link_rows(db: &TestDb, table: LinkTable, recipe_id: i64) -> BTreeSet<i64> {
        table.related_ids(&db.pool, recipe_id).await.unwrap()
    }

    fn assert_validation(err: ServiceError, code: &str) {
        match err {
            ServiceError::Validation(e) => assert_eq!(e.code, code),
            other => panic!("expected validation error {}, got {:?}", code, other),
        }
    }

    #[tokio::test]
    async fn test_create_recipe_links_and_indexes() {
        let (services, db) = services().await;
        let salt = services
            .ingredients
            .create(Ingredient::new("Salt"))
            .await
            .unwrap();
        let salt_id = salt.id.unwrap();

        let recipe = Recipe::new("Soup", Cooking::WithCooking)
            .with_cooking_time(10.0)
            .with_ingredients(vec![Ingredient::reference(salt_id)]);
        let saved = services.recipes.create(recipe).await.unwrap();
        let recipe_id = saved.id.unwrap();

        assert_eq!(
            link_rows(&db, RECIPE_INGREDIENTS, recipe_id).await,
            BTreeSet::from([salt_id])
        );
        // Nested ingredients are re-read, not echoed from the request
        assert_eq!(saved.ingredients[0].name, "Salt");

        let hits = services.recipes.search("soup").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Soup");
        assert_eq!(hits[0].id, Some(recipe_id));
    }

    #[tokio::test]
    async fn test_create_then_find_round_trip() {
        let (services, _db) = services().await;
        let chop = services.steps.create(Step::new("Chop")).await.unwrap();

        let recipe = Recipe::new("Salsa", Cooking::WithoutCooking)
            .with_picture(vec![0xff, 0xd8], "image/jpeg")
            .with_steps(vec![Step::reference(chop.id.unwrap())]);
        let saved = services.recipes.create(recipe.clone()).await.unwrap();

        let found = services
            .recipes
            .find_by_id(&saved.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, recipe.name);
        assert_eq!(found.cooking, recipe.cooking);
        assert_eq!(found.picture, recipe.picture);
        assert_eq!(found.step_ids(), recipe.step_ids());
    }

    #[tokio::test]
    async fn test_create_with_id_is_rejected() {
        let (services, _db) = services().await;

        let mut ingredient = Ingredient::new("Pepper");
        ingredient.id = Some(42);
        let err = services.ingredients.create(ingredient).await.unwrap_err();

        assert_validation(err, "idexists");
        assert_eq!(services.ingredients.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_fields() {
        let (services, _db) = services().await;

        let err = services
            .recipes
            .create(Recipe::new("Stew", Cooking::WithCooking).with_cooking_time(70000.0))
            .await
            .unwrap_err();
        assert_validation(err, "cookingtimerange");

        let err = services
            .techniques
            .create(Technique::new("  "))
            .await
            .unwrap_err();
        assert_validation(err, "descriptionrequired");
    }

    #[tokio::test]
    async fn test_full_update_identity_checks() {
        let (services, _db) = services().await;
        let saved = services
            .recipes
            .create(Recipe::new("Soup", Cooking::WithCooking))
            .await
            .unwrap();
        let id = saved.id.unwrap();

        let mut changed = saved.clone();
        changed.cooking = Cooking::WithoutCooking;

        let err = services
            .recipes
            .full_update(&(id + 1), changed.clone())
            .await
            .unwrap_err();
        assert_validation(err, "idinvalid");

        let mut no_id = changed.clone();
        no_id.id = None;
        let err = services.recipes.full_update(&id, no_id).await.unwrap_err();
        assert_validation(err, "idnull");

        let mut ghost = changed.clone();
        ghost.id = Some(999);
        let err = services.recipes.full_update(&999, ghost).await.unwrap_err();
        assert_validation(err, "idnotfound");

        // None of the rejected updates reached the store
        let stored = services.recipes.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.cooking, Cooking::WithCooking);
    }

    #[tokio::test]
    async fn test_full_update_replaces_ingredient_set() {
        let (services, db) = services().await;
        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            let saved = services
                .ingredients
                .create(Ingredient::new(name))
                .await
                .unwrap();
            ids.push(saved.id.unwrap());
        }
        let (a, b, c) = (ids[0], ids[1], ids[2]);

        let recipe = Recipe::new("Mix", Cooking::WithoutCooking)
            .with_ingredients(vec![Ingredient::reference(a), Ingredient::reference(b)]);
        let saved = services.recipes.create(recipe).await.unwrap();
        let recipe_id = saved.id.unwrap();

        let updated = saved
            .clone()
            .with_ingredients(vec![Ingredient::reference(b), Ingredient::reference(c)]);
        let result = services
            .recipes
            .full_update(&recipe_id, updated)
            .await
            .unwrap();

        assert_eq!(result.ingredient_ids(), BTreeSet::from([b, c]));
        assert_eq!(
            link_rows(&db, RECIPE_INGREDIENTS, recipe_id).await,
            BTreeSet::from([b, c])
        );
    }

    #[tokio::test]
    async fn test_partial_update_preserves_untouched_fields() {
        let (services, db) = services().await;
        let step = services.steps.create(Step::new("Boil")).await.unwrap();
        let step_id = step.id.unwrap();

        let recipe = Recipe::new("Soup", Cooking::WithCooking)
            .with_cooking_time(5.0)
            .with_steps(vec![Step::reference(step_id)]);
        let saved = services.recipes.create(recipe).await.unwrap();
        let id = saved.id.unwrap();

        let patch = RecipePatch {
            id: Some(id),
            name: Some("Broth".to_string()),
            ..Default::default()
        };
        let patched = services.recipes.partial_update(&id, patch).await.unwrap();

        assert_eq!(patched.name, "Broth");
        assert_eq!(patched.cooking_time, Some(5.0));
        assert_eq!(patched.cooking, Cooking::WithCooking);
        assert_eq!(
            link_rows(&db, RECIPE_STEPS, id).await,
            BTreeSet::from([step_id])
        );
        assert_eq!(services.recipes.search("broth").await.unwrap().len(), 1);
        assert!(services.recipes.search("soup").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_update_identity_checks() {
        let (services, _db) = services().await;
        let saved = services
            .techniques
            .create(Technique::new("Braising"))
            .await
            .unwrap();
        let id = saved.id.unwrap();

        let patch = TechniquePatch {
            id: Some("other".to_string()),
            description: Some("Stewing".to_string()),
        };
        let err = services
            .techniques
            .partial_update(&id, patch)
            .await
            .unwrap_err();
        assert_validation(err, "idinvalid");

        let patch = IngredientPatch {
            id: Some(5),
            name: Some("Thyme".to_string()),
        };
        let err = services
            .ingredients
            .partial_update(&5, patch)
            .await
            .unwrap_err();
        assert_validation(err, "idnotfound");
    }

    #[tokio::test]
    async fn test_delete_recipe_unlinks_first() {
        let (services, db) = services().await;
        let salt = services
            .ingredients
            .create(Ingredient::new("Salt"))
            .await
            .unwrap();
        let stir = services.steps.create(Step::new("Stir")).await.unwrap();

        let recipe = Recipe::new("Soup", Cooking::WithCooking)
            .with_ingredients(vec![Ingredient::reference(salt.id.unwrap())])
            .with_steps(vec![Step::reference(stir.id.unwrap())]);
        let id = services.recipes.create(recipe).await.unwrap().id.unwrap();

        services.recipes.delete(&id).await.unwrap();

        assert!(link_rows(&db, RECIPE_INGREDIENTS, id).await.is_empty());
        assert!(link_rows(&db, RECIPE_STEPS, id).await.is_empty());
        assert!(services.recipes.find_by_id(&id).await.unwrap().is_none());
        assert!(services.recipes.search("*").await.unwrap().is_empty());

        // Related rows survive the recipe
        assert!(services
            .ingredients
            .find_by_id(&salt.id.unwrap())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (services, _db) = services().await;

        let err = services.steps.delete(&12).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "step", .. }));

        let err = services
            .techniques
            .delete(&"nope".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_index_failure_keeps_primary_write() {
        let db = test_db().await;
        let services = Services::new(db.pool.clone(), Arc::new(BrokenIndex));

        let err = services
            .ingredients
            .create(Ingredient::new("Basil"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Search(_)));

        // The row was committed before the mirror failed
        let all = services.ingredients.find_all(None, false).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Basil");
    }

    #[tokio::test]
    async fn test_reconcile_failure_keeps_primary_row() {
        let (services, db) = services().await;

        // 9999 is not an ingredient: the link insert fails after the row write
        let recipe = Recipe::new("Soup", Cooking::WithCooking)
            .with_ingredients(vec![Ingredient::reference(9999)]);
        let err = services.recipes.create(recipe).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));

        assert_eq!(services.recipes.count().await.unwrap(), 1);
        let stored = services.recipes.find_all(None, false).await.unwrap();
        let id = stored[0].id.unwrap();
        assert!(link_rows(&db, RECIPE_INGREDIENTS, id).await.is_empty());
        assert!(services.recipes.search("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_all_eager_and_lazy() {
        let (services, _db) = services().await;
        let salt = services
            .ingredients
            .create(Ingredient::new("Salt"))
            .await
            .unwrap();
        services
            .recipes
            .create(
                Recipe::new("Soup", Cooking::WithCooking)
                    .with_ingredients(vec![Ingredient::reference(salt.id.unwrap())]),
            )
            .await
            .unwrap();

        let eager = services.recipes.find_all(None, true).await.unwrap();
        assert_eq!(eager[0].ingredients.len(), 1);

        let lazy = services.recipes.find_all(None, false).await.unwrap();
        assert!(lazy[0].ingredients.is_empty());

        let ingredient = services
            .ingredients
            .find_by_id(&salt.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ingredient.recipes[0].name, "Soup");
    }
}
