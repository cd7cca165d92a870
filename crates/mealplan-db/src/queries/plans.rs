//! Database query functions for the `meal_plans` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{MealPlan, PlanStatus};

/// Return the plan for a household's week, creating a draft if none exists.
pub async fn get_or_create_plan(
    pool: &PgPool,
    household_id: Uuid,
    week_start: NaiveDate,
) -> Result<MealPlan> {
    let plan = sqlx::query_as::<_, MealPlan>(
        "INSERT INTO meal_plans (household_id, week_start) VALUES ($1, $2) \
         ON CONFLICT (household_id, week_start) DO UPDATE SET updated_at = now() \
         RETURNING *",
    )
    .bind(household_id)
    .bind(week_start)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to get or create plan for week of {week_start}"))?;

    Ok(plan)
}

/// Store the summary text and nutrition rollup, marking the plan generated.
pub async fn save_summary(
    pool: &PgPool,
    id: Uuid,
    summary: &str,
    nutrition: &serde_json::Value,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE meal_plans \
         SET summary = $1, nutrition = $2, status = 'generated', updated_at = now() \
         WHERE id = $3",
    )
    .bind(summary)
    .bind(Json(nutrition))
    .bind(id)
    .execute(pool)
    .await
    .context("failed to save plan summary")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("meal plan {id} not found");
    }
    Ok(())
}

/// Update the status of a plan.
pub async fn update_plan_status(pool: &PgPool, id: Uuid, status: PlanStatus) -> Result<()> {
    let result = sqlx::query("UPDATE meal_plans SET status = $1, updated_at = now() WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update plan status")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("meal plan {id} not found");
    }
    Ok(())
}
