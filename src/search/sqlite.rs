use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::path::Path;
use std::str::FromStr;

use super::{query_terms, SearchError, SearchIndex};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS search_document (
    index_name TEXT NOT NULL,
    doc_id TEXT NOT NULL,
    body TEXT NOT NULL,
    content TEXT NOT NULL,
    PRIMARY KEY (index_name, doc_id)
)";

/// Document index kept in its own SQLite file, apart from the primary store.
pub struct SqliteSearchIndex {
    pool: SqlitePool,
}

impl SqliteSearchIndex {
    pub async fn open(path: &Path) -> Result<Self, SearchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        tracing::debug!("Search index ready at {}", path.display());
        Ok(Self { pool })
    }
}

/// Escapes LIKE wildcards so query terms match literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl SearchIndex for SqliteSearchIndex {
    async fn save(
        &self,
        index: &str,
        id: &str,
        document: &Value,
        text: &str,
    ) -> Result<(), SearchError> {
        let body = serde_json::to_string(document)?;

        sqlx::query(
            "INSERT INTO search_document (index_name, doc_id, body, content) VALUES (?, ?, ?, ?)
             ON CONFLICT (index_name, doc_id) DO UPDATE SET body = excluded.body, content = excluded.content",
        )
        .bind(index)
        .bind(id)
        .bind(body)
        .bind(text.to_lowercase())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, index: &str, id: &str) -> Result<(), SearchError> {
        sqlx::query("DELETE FROM search_document WHERE index_name = ? AND doc_id = ?")
            .bind(index)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn search(&self, index: &str, query: &str) -> Result<Vec<Value>, SearchError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT body FROM search_document WHERE index_name = ");
        builder.push_bind(index.to_string());

        for term in query_terms(query).unwrap_or_default() {
            builder.push(" AND content LIKE ");
            builder.push_bind(like_pattern(&term));
            builder.push(" ESCAPE '\\'");
        }
        builder.push(" ORDER BY doc_id");

        let rows: Vec<(String,)> = builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(body,)| serde_json::from_str(&body).map_err(SearchError::from))
            .collect()
    }
}
