use async_trait::async_trait;
use cookbook_core::{Entity, Technique};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{DbError, EntityStore, PageRequest};

/// Techniques are keyed by generated UUID text rather than a row counter.
pub struct TechniqueRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct TechniqueRow {
    id: String,
    description: String,
}

impl From<TechniqueRow> for Technique {
    fn from(row: TechniqueRow) -> Self {
        Technique {
            id: Some(row.id),
            description: row.description,
        }
    }
}

impl TechniqueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for TechniqueRepository {
    type Entity = Technique;

    async fn insert(&self, technique: &Technique) -> Result<Technique, DbError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO technique (id, description) VALUES (?, ?)")
            .bind(&id)
            .bind(&technique.description)
            .execute(&self.pool)
            .await?;

        Ok(Technique {
            id: Some(id),
            description: technique.description.clone(),
        })
    }

    async fn update(&self, technique: &Technique) -> Result<u64, DbError> {
        let id = technique
            .id
            .as_deref()
            .ok_or_else(|| DbError::not_found(Technique::NAME, "<unsaved>"))?;

        let result = sqlx::query("UPDATE technique SET description = ? WHERE id = ?")
            .bind(&technique.description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            0 => Err(DbError::not_found(Technique::NAME, id)),
            n => Ok(n),
        }
    }

    async fn find_by_id(&self, id: &String) -> Result<Option<Technique>, DbError> {
        let row: Option<TechniqueRow> =
            sqlx::query_as("SELECT id, description FROM technique WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Technique::from))
    }

    async fn find_all(&self, page: Option<PageRequest>) -> Result<Vec<Technique>, DbError> {
        let (limit, offset) = PageRequest::limit_offset(page);

        // rowid keeps insertion order for the random UUID keys
        let rows: Vec<TechniqueRow> = sqlx::query_as(
            "SELECT id, description FROM technique ORDER BY rowid LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Technique::from).collect())
    }

    async fn exists_by_id(&self, id: &String) -> Result<bool, DbError> {
        let found: Option<(String,)> = sqlx::query_as("SELECT id FROM technique WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn delete_by_id(&self, id: &String) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM technique WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(Technique::NAME, id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM technique")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
