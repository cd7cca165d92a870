//! Database query functions for the `planning_rules` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::PlanningRules;

/// Fetch the stored rule set for a household, if any.
pub async fn get_rules(pool: &PgPool, household_id: Uuid) -> Result<Option<PlanningRules>> {
    let row: Option<(Json<PlanningRules>,)> =
        sqlx::query_as("SELECT rules FROM planning_rules WHERE household_id = $1")
            .bind(household_id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch planning rules")?;

    Ok(row.map(|(rules,)| rules.0))
}

/// Insert or replace the rule set for a household.
pub async fn upsert_rules(pool: &PgPool, household_id: Uuid, rules: &PlanningRules) -> Result<()> {
    sqlx::query(
        "INSERT INTO planning_rules (household_id, rules) VALUES ($1, $2) \
         ON CONFLICT (household_id) DO UPDATE SET rules = EXCLUDED.rules, updated_at = now()",
    )
    .bind(household_id)
    .bind(Json(rules))
    .execute(pool)
    .await
    .context("failed to store planning rules")?;

    Ok(())
}
