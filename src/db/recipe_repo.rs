use async_trait::async_trait;
use cookbook_core::{CookingParseError, Entity, Ingredient, Recipe, Step};
use sqlx::SqlitePool;

use super::links::{RECIPE_INGREDIENTS, RECIPE_STEPS};
use super::{DbError, EntityStore, PageRequest};

pub struct RecipeRepository {
    pool: SqlitePool,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: i64,
    name: String,
    cooking: String,
    cooking_time: Option<f64>,
    picture: Option<Vec<u8>>,
    picture_content_type: Option<String>,
}

/// One recipe column set plus at most one related ingredient or step.
#[derive(sqlx::FromRow)]
struct RecipeRelationRow {
    #[sqlx(flatten)]
    recipe: RecipeRow,
    rel_kind: String,
    rel_id: Option<i64>,
    rel_label: Option<String>,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = CookingParseError;

    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        Ok(Recipe {
            id: Some(row.id),
            name: row.name,
            cooking: row.cooking.parse()?,
            cooking_time: row.cooking_time,
            picture: row.picture,
            picture_content_type: row.picture_content_type,
            ingredients: Vec::new(),
            steps: Vec::new(),
        })
    }
}

const SELECT_RECIPE: &str =
    "SELECT id, name, cooking, cooking_time, picture, picture_content_type FROM recipe";

// A page of recipes joined with both link tables in a single round trip. The
// ingredient branch uses LEFT JOINs so every recipe yields at least one row.
const SELECT_WITH_RELATIONS: &str = r#"
    WITH page AS (
        SELECT id, name, cooking, cooking_time, picture, picture_content_type
        FROM recipe
        WHERE (? IS NULL OR id = ?)
        ORDER BY id
        LIMIT ? OFFSET ?
    )
    SELECT p.id, p.name, p.cooking, p.cooking_time, p.picture, p.picture_content_type,
           'ingredient' AS rel_kind, i.id AS rel_id, i.name AS rel_label
    FROM page p
    LEFT JOIN rel_recipe__ingredients ri ON ri.recipe_id = p.id
    LEFT JOIN ingredient i ON i.id = ri.ingredients_id
    UNION ALL
    SELECT p.id, p.name, p.cooking, p.cooking_time, p.picture, p.picture_content_type,
           'step' AS rel_kind, s.id AS rel_id, s.action AS rel_label
    FROM page p
    JOIN rel_recipe__steps rs ON rs.recipe_id = p.id
    JOIN step s ON s.id = rs.steps_id
    ORDER BY 1, 7, 8
"#;

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn select_with_relations(
        &self,
        id: Option<i64>,
        page: Option<PageRequest>,
    ) -> Result<Vec<Recipe>, DbError> {
        let (limit, offset) = PageRequest::limit_offset(page);

        let rows: Vec<RecipeRelationRow> = sqlx::query_as(SELECT_WITH_RELATIONS)
            .bind(id)
            .bind(id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        fold_relations(rows)
    }
}

/// Groups joined rows (ordered by recipe ID) into recipes with relations.
fn fold_relations(rows: Vec<RecipeRelationRow>) -> Result<Vec<Recipe>, DbError> {
    let mut recipes: Vec<Recipe> = Vec::new();

    for row in rows {
        let RecipeRelationRow {
            recipe,
            rel_kind,
            rel_id,
            rel_label,
        } = row;

        if recipes.last().map_or(true, |r| r.id != Some(recipe.id)) {
            recipes.push(Recipe::try_from(recipe)?);
        }
        let (Some(current), Some(related_id)) = (recipes.last_mut(), rel_id) else {
            continue;
        };

        let label = rel_label.unwrap_or_default();
        match rel_kind.as_str() {
            "ingredient" => current.ingredients.push(Ingredient {
                id: Some(related_id),
                name: label,
                recipes: Vec::new(),
            }),
            "step" => current.steps.push(Step {
                id: Some(related_id),
                action: label,
                recipes: Vec::new(),
            }),
            _ => {}
        }
    }

    Ok(recipes)
}

#[async_trait]
impl EntityStore for RecipeRepository {
    type Entity = Recipe;

    async fn insert(&self, recipe: &Recipe) -> Result<Recipe, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO recipe (name, cooking, cooking_time, picture, picture_content_type)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&recipe.name)
        .bind(recipe.cooking.as_str())
        .bind(recipe.cooking_time)
        .bind(&recipe.picture)
        .bind(&recipe.picture_content_type)
        .execute(&self.pool)
        .await?;

        let mut saved = recipe.clone();
        saved.set_id(result.last_insert_rowid());
        Ok(saved)
    }

    async fn update(&self, recipe: &Recipe) -> Result<u64, DbError> {
        let id = recipe
            .id
            .ok_or_else(|| DbError::not_found(Recipe::NAME, "<unsaved>"))?;

        let result = sqlx::query(
            r#"
            UPDATE recipe
            SET name = ?, cooking = ?, cooking_time = ?, picture = ?, picture_content_type = ?
            WHERE id = ?
            "#,
        )
        .bind(&recipe.name)
        .bind(recipe.cooking.as_str())
        .bind(recipe.cooking_time)
        .bind(&recipe.picture)
        .bind(&recipe.picture_content_type)
        .bind(id)
        .execute(&self.pool)
        .await?;

        match result.rows_affected() {
            0 => Err(DbError::not_found(Recipe::NAME, id)),
            n => Ok(n),
        }
    }

    async fn find_by_id(&self, id: &i64) -> Result<Option<Recipe>, DbError> {
        let row: Option<RecipeRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_RECIPE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Recipe::try_from).transpose()?)
    }

    async fn find_all(&self, page: Option<PageRequest>) -> Result<Vec<Recipe>, DbError> {
        let (limit, offset) = PageRequest::limit_offset(page);

        let rows: Vec<RecipeRow> =
            sqlx::query_as(&format!("{} ORDER BY id LIMIT ? OFFSET ?", SELECT_RECIPE))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|row| Recipe::try_from(row).map_err(DbError::from))
            .collect()
    }

    async fn exists_by_id(&self, id: &i64) -> Result<bool, DbError> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM recipe WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn delete_by_id(&self, id: &i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM recipe WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(Recipe::NAME, id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipe")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_by_id_with_relations(&self, id: &i64) -> Result<Option<Recipe>, DbError> {
        let mut recipes = self.select_with_relations(Some(*id), None).await?;
        Ok(recipes.pop())
    }

    async fn find_all_with_relations(
        &self,
        page: Option<PageRequest>,
    ) -> Result<Vec<Recipe>, DbError> {
        self.select_with_relations(None, page).await
    }

    async fn sync_relations(&self, recipe: &Recipe) -> Result<(), DbError> {
        let id = recipe
            .id
            .ok_or_else(|| DbError::not_found(Recipe::NAME, "<unsaved>"))?;

        RECIPE_INGREDIENTS
            .reconcile(&self.pool, id, &recipe.ingredient_ids())
            .await?;
        RECIPE_STEPS
            .reconcile(&self.pool, id, &recipe.step_ids())
            .await?;
        Ok(())
    }

    async fn unlink_relations(&self, id: &i64) -> Result<(), DbError> {
        let ingredients = RECIPE_INGREDIENTS
            .delete_all_for_owner(&self.pool, *id)
            .await?;
        let steps = RECIPE_STEPS.delete_all_for_owner(&self.pool, *id).await?;

        tracing::debug!(recipe_id = id, ingredients, steps, "Removed recipe links");
        Ok(())
    }
}
