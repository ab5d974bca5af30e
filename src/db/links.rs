//! Relation synchronizer for many-to-many link tables.
//!
//! A link table only stores `(owner_id, related_id)` pairs. The owner side is
//! the source of truth: [`LinkTable::reconcile`] replaces an owner's rows
//! wholesale with a target set, and the inverse view is rebuilt by query
//! ([`LinkTable::owners_of`]) instead of being stored.

use cookbook_core::RecipeRef;
use sqlx::SqlitePool;
use std::collections::BTreeSet;

/// A join table between an owning table and a related table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTable {
    pub name: &'static str,
    pub owner_table: &'static str,
    pub owner_column: &'static str,
    pub related_column: &'static str,
}

pub const RECIPE_INGREDIENTS: LinkTable = LinkTable {
    name: "rel_recipe__ingredients",
    owner_table: "recipe",
    owner_column: "recipe_id",
    related_column: "ingredients_id",
};

pub const RECIPE_STEPS: LinkTable = LinkTable {
    name: "rel_recipe__steps",
    owner_table: "recipe",
    owner_column: "recipe_id",
    related_column: "steps_id",
};

#[derive(sqlx::FromRow)]
struct RelatedIdRow {
    related_id: i64,
}

impl LinkTable {
    /// Makes the rows for `owner_id` exactly equal to `targets`.
    ///
    /// Deletes every existing row for the owner and inserts one row per
    /// target, inside a single transaction: a failed insert (for example a
    /// target that violates the foreign key) leaves the previous links intact.
    pub async fn reconcile(
        &self,
        pool: &SqlitePool,
        owner_id: i64,
        targets: &BTreeSet<i64>,
    ) -> Result<(), sqlx::Error> {
        let delete = format!("DELETE FROM {} WHERE {} = ?", self.name, self.owner_column);
        let insert = format!(
            "INSERT INTO {} ({}, {}) VALUES (?, ?)",
            self.name, self.owner_column, self.related_column
        );

        let mut tx = pool.begin().await?;

        sqlx::query(&delete)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        for related_id in targets {
            sqlx::query(&insert)
                .bind(owner_id)
                .bind(*related_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            link_table = self.name,
            owner_id,
            links = targets.len(),
            "Reconciled link table"
        );
        Ok(())
    }

    /// Removes every row owned by `owner_id`, returning how many were removed.
    pub async fn delete_all_for_owner(
        &self,
        pool: &SqlitePool,
        owner_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let delete = format!("DELETE FROM {} WHERE {} = ?", self.name, self.owner_column);
        let result = sqlx::query(&delete).bind(owner_id).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// The persisted related IDs for `owner_id`.
    pub async fn related_ids(
        &self,
        pool: &SqlitePool,
        owner_id: i64,
    ) -> Result<BTreeSet<i64>, sqlx::Error> {
        let select = format!(
            "SELECT {} AS related_id FROM {} WHERE {} = ?",
            self.related_column, self.name, self.owner_column
        );
        let rows: Vec<RelatedIdRow> = sqlx::query_as(&select)
            .bind(owner_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.related_id).collect())
    }

    /// Owners linked to `related_id`: the inverse side of the relation.
    pub async fn owners_of(
        &self,
        pool: &SqlitePool,
        related_id: i64,
    ) -> Result<Vec<RecipeRef>, sqlx::Error> {
        let select = format!(
            "SELECT o.id, o.name FROM {owner} o JOIN {link} l ON o.id = l.{owner_column} \
             WHERE l.{related_column} = ? ORDER BY o.id",
            owner = self.owner_table,
            link = self.name,
            owner_column = self.owner_column,
            related_column = self.related_column,
        );
        let rows: Vec<(i64, String)> = sqlx::query_as(&select)
            .bind(related_id)
            .fetch_all(pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| RecipeRef { id, name })
            .collect())
    }
}
