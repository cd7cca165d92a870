//! PostgreSQL-backed [`PlanRepository`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use mealplan_db::models::{PlanStatus, PlanningRules, Profile, Recipe, UsageEntry};
use mealplan_db::queries::meals::{self, NewPlannedMeal};
use mealplan_db::queries::{plans, profiles, recipes, rules, usage};

use super::PlanRepository;
use crate::plan::LockedMeal;
use crate::reconcile::{NutritionRollup, ReconciledMeal};

#[derive(Debug, Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn load_profiles(&self, household_id: Uuid) -> Result<Vec<Profile>> {
        profiles::list_profiles(&self.pool, household_id).await
    }

    async fn load_recipes(&self, household_id: Uuid, limit: i64) -> Result<Vec<Recipe>> {
        recipes::list_active_recipes(&self.pool, household_id, limit).await
    }

    async fn load_recipes_by_ids(&self, household_id: Uuid, ids: &[Uuid]) -> Result<Vec<Recipe>> {
        recipes::get_recipes_by_ids(&self.pool, household_id, ids).await
    }

    async fn load_rules(&self, household_id: Uuid) -> Result<Option<PlanningRules>> {
        rules::get_rules(&self.pool, household_id).await
    }

    async fn load_history(
        &self,
        household_id: Uuid,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<UsageEntry>> {
        usage::list_usage(&self.pool, household_id, since, until).await
    }

    async fn ensure_plan(&self, household_id: Uuid, week_start: NaiveDate) -> Result<Uuid> {
        let plan = plans::get_or_create_plan(&self.pool, household_id, week_start).await?;
        Ok(plan.id)
    }

    async fn load_locked_meals(&self, plan_id: Uuid) -> Result<Vec<LockedMeal>> {
        let locked = meals::list_locked_meals(&self.pool, plan_id).await?;
        Ok(locked.into_iter().map(LockedMeal::from).collect())
    }

    async fn save_meals(&self, plan_id: Uuid, meals: &[ReconciledMeal]) -> Result<()> {
        let rows: Vec<NewPlannedMeal<'_>> = meals
            .iter()
            .filter(|m| !m.locked)
            .map(|m| NewPlannedMeal {
                id: m.id,
                day: m.day,
                meal_date: m.date,
                meal_type: m.meal_type,
                recipe_id: m.recipe_id,
                recipe_name: &m.recipe_name,
                servings: i32::try_from(m.servings).unwrap_or(i32::MAX),
                scaling_factor: m.scaling_factor,
                is_leftover: m.is_leftover,
                batch_cook_source_day: m.batch_cook_source_day,
                notes: m.notes.as_deref(),
            })
            .collect();
        meals::replace_unlocked_meals(&self.pool, plan_id, &rows).await
    }

    async fn link_leftovers(&self, links: &[(Uuid, Uuid)]) -> Result<()> {
        meals::set_leftover_links(&self.pool, links).await
    }

    async fn record_usage(&self, household_id: Uuid, entries: &[UsageEntry]) -> Result<u64> {
        usage::record_usage(&self.pool, household_id, entries).await
    }

    async fn save_summary(
        &self,
        plan_id: Uuid,
        summary: &str,
        nutrition: &NutritionRollup,
    ) -> Result<()> {
        plans::save_summary(&self.pool, plan_id, summary, &nutrition.to_json()).await
    }

    async fn mark_failed(&self, plan_id: Uuid) -> Result<()> {
        plans::update_plan_status(&self.pool, plan_id, PlanStatus::Failed).await
    }
}
