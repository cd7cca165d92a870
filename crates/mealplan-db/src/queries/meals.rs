//! Database query functions for the `planned_meals` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{DayOfWeek, MealType, PlannedMeal};

/// Parameters for inserting a planned meal. The id is assigned by the caller
/// so leftover references can be resolved before anything is written.
#[derive(Debug, Clone)]
pub struct NewPlannedMeal<'a> {
    pub id: Uuid,
    pub day: DayOfWeek,
    pub meal_date: NaiveDate,
    pub meal_type: MealType,
    pub recipe_id: Option<Uuid>,
    pub recipe_name: &'a str,
    pub servings: i32,
    pub scaling_factor: Option<f64>,
    pub is_leftover: bool,
    pub batch_cook_source_day: Option<DayOfWeek>,
    pub notes: Option<&'a str>,
}

/// List the meals pinned by the user in a prior version of the plan.
pub async fn list_locked_meals(pool: &PgPool, plan_id: Uuid) -> Result<Vec<PlannedMeal>> {
    let meals = sqlx::query_as::<_, PlannedMeal>(
        "SELECT * FROM planned_meals WHERE plan_id = $1 AND locked ORDER BY meal_date",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list locked meals")?;

    Ok(meals)
}

/// Replace every unlocked meal of a plan with `meals` in one transaction.
///
/// Leftover references are not written here; see [`set_leftover_links`].
/// Locked meals are left untouched.
pub async fn replace_unlocked_meals(
    pool: &PgPool,
    plan_id: Uuid,
    meals: &[NewPlannedMeal<'_>],
) -> Result<()> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    sqlx::query("DELETE FROM planned_meals WHERE plan_id = $1 AND NOT locked")
        .bind(plan_id)
        .execute(&mut *tx)
        .await
        .context("failed to clear unlocked meals")?;

    for meal in meals {
        sqlx::query(
            "INSERT INTO planned_meals \
             (id, plan_id, day, meal_date, meal_type, recipe_id, recipe_name, servings, \
              scaling_factor, is_leftover, batch_cook_source_day, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(meal.id)
        .bind(plan_id)
        .bind(meal.day)
        .bind(meal.meal_date)
        .bind(meal.meal_type)
        .bind(meal.recipe_id)
        .bind(meal.recipe_name)
        .bind(meal.servings)
        .bind(meal.scaling_factor)
        .bind(meal.is_leftover)
        .bind(meal.batch_cook_source_day)
        .bind(meal.notes)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert {} {} meal", meal.day, meal.meal_type))?;
    }

    tx.commit().await.context("failed to commit planned meals")?;
    Ok(())
}

/// Point each leftover meal at its source and clear the textual source day.
///
/// `links` holds `(leftover_meal_id, source_meal_id)` pairs.
pub async fn set_leftover_links(pool: &PgPool, links: &[(Uuid, Uuid)]) -> Result<()> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    for (leftover_id, source_id) in links {
        let result = sqlx::query(
            "UPDATE planned_meals \
             SET leftover_from_meal_id = $1, batch_cook_source_day = NULL \
             WHERE id = $2",
        )
        .bind(source_id)
        .bind(leftover_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to link leftover meal {leftover_id}"))?;

        if result.rows_affected() == 0 {
            anyhow::bail!("leftover meal {leftover_id} not found");
        }
    }

    tx.commit().await.context("failed to commit leftover links")?;
    Ok(())
}
