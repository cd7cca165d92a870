//! Database query functions for the `recipe_usage` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::UsageEntry;

/// Usage entries in `[since, until)`, oldest first.
pub async fn list_usage(
    pool: &PgPool,
    household_id: Uuid,
    since: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<UsageEntry>> {
    let entries = sqlx::query_as::<_, UsageEntry>(
        "SELECT recipe_id, used_on, meal_type FROM recipe_usage \
         WHERE household_id = $1 AND used_on >= $2 AND used_on < $3 \
         ORDER BY used_on",
    )
    .bind(household_id)
    .bind(since)
    .bind(until)
    .fetch_all(pool)
    .await
    .context("failed to list recipe usage")?;

    Ok(entries)
}

/// Append usage entries. Entries already recorded for the same
/// (day, meal type, recipe) are skipped, so regenerating a week is safe.
///
/// Returns the number of rows actually inserted.
pub async fn record_usage(
    pool: &PgPool,
    household_id: Uuid,
    entries: &[UsageEntry],
) -> Result<u64> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;
    let mut inserted = 0;

    for entry in entries {
        let result = sqlx::query(
            "INSERT INTO recipe_usage (household_id, recipe_id, used_on, meal_type) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT DO NOTHING",
        )
        .bind(household_id)
        .bind(entry.recipe_id)
        .bind(entry.used_on)
        .bind(entry.meal_type)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to record usage of recipe {}", entry.recipe_id))?;
        inserted += result.rows_affected();
    }

    tx.commit().await.context("failed to commit usage history")?;
    Ok(inserted)
}
