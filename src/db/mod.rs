//! Primary store: SQLite pool setup and one repository per entity type.

mod catalog_repo;
mod error;
pub mod links;
mod recipe_repo;
mod store;
mod technique_repo;

pub use catalog_repo::{CatalogItem, CatalogRepository, IngredientRepository, StepRepository};
pub use error::DbError;
pub use recipe_repo::RecipeRepository;
pub use store::{EntityId, EntityStore, PageRequest};
pub use technique_repo::TechniqueRepository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!("Database ready at {}", path.display());
    Ok(pool)
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_db_creates_tables() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let pool = init_db(&db_path).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '_sqlx_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(
            table_names,
            vec![
                "ingredient",
                "recipe",
                "rel_recipe__ingredients",
                "rel_recipe__steps",
                "step",
                "technique",
            ]
        );
    }

    #[tokio::test]
    async fn test_init_db_is_reentrant() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let first = init_db(&db_path).await.unwrap();
        first.close().await;
        assert!(init_db(&db_path).await.is_ok());
    }
}
