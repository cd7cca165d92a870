//! Database query functions for the `recipes` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Recipe, RecipeRow};

/// Load up to `limit` active (non-archived) recipes for a household.
///
/// When the library is larger than `limit`, a random sample is returned so
/// repeated generations see different parts of the library.
pub async fn list_active_recipes(
    pool: &PgPool,
    household_id: Uuid,
    limit: i64,
) -> Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(
        "SELECT * FROM recipes \
         WHERE household_id = $1 AND NOT archived \
         ORDER BY random() \
         LIMIT $2",
    )
    .bind(household_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list recipes for household {household_id}"))?;

    Ok(rows.into_iter().map(RecipeRow::into_recipe).collect())
}

/// Fetch specific recipes by id, archived or not. Used to resolve mandatory
/// recipes that fell outside the sampled pool.
pub async fn get_recipes_by_ids(
    pool: &PgPool,
    household_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<Recipe>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, RecipeRow>(
        "SELECT * FROM recipes WHERE household_id = $1 AND id = ANY($2)",
    )
    .bind(household_id)
    .bind(ids)
    .fetch_all(pool)
    .await
    .context("failed to fetch recipes by id")?;

    Ok(rows.into_iter().map(RecipeRow::into_recipe).collect())
}
