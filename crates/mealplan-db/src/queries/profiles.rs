//! Database query functions for the `profiles` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Profile, ProfileRow};

/// List every profile in a household, ordered by name.
pub async fn list_profiles(pool: &PgPool, household_id: Uuid) -> Result<Vec<Profile>> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, household_id, name, target_calories, target_protein_g, \
                target_carbs_g, target_fat_g, meal_slots, dietary_notes \
         FROM profiles WHERE household_id = $1 ORDER BY name",
    )
    .bind(household_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list profiles for household {household_id}"))?;

    Ok(rows.into_iter().map(Profile::from).collect())
}
