//! Persistence seam for the planning service.
//!
//! [`PgPlanRepository`] stores plans in PostgreSQL through `mealplan-db`;
//! [`InMemoryRepository`] keeps everything in process for tests and
//! offline runs.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mealplan_db::models::{PlanningRules, Profile, Recipe, UsageEntry};
use uuid::Uuid;

use crate::plan::LockedMeal;
use crate::reconcile::{NutritionRollup, ReconciledMeal};

pub use memory::InMemoryRepository;
pub use postgres::PgPlanRepository;

/// Storage operations used by [`crate::service::generate_meal_plan`].
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn load_profiles(&self, household_id: Uuid) -> Result<Vec<Profile>>;

    /// Up to `limit` active recipes, in no particular order.
    async fn load_recipes(&self, household_id: Uuid, limit: i64) -> Result<Vec<Recipe>>;

    async fn load_recipes_by_ids(&self, household_id: Uuid, ids: &[Uuid]) -> Result<Vec<Recipe>>;

    /// Stored rules, or `None` when the household has never saved any.
    async fn load_rules(&self, household_id: Uuid) -> Result<Option<PlanningRules>>;

    /// Usage on dates in `[since, until)`.
    async fn load_history(
        &self,
        household_id: Uuid,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<UsageEntry>>;

    /// Id of the household's plan for `week_start`, created if missing.
    async fn ensure_plan(&self, household_id: Uuid, week_start: NaiveDate) -> Result<Uuid>;

    async fn load_locked_meals(&self, plan_id: Uuid) -> Result<Vec<LockedMeal>>;

    /// Replace the plan's unlocked meals with `meals`. Locked meals in
    /// `meals` are skipped.
    async fn save_meals(&self, plan_id: Uuid, meals: &[ReconciledMeal]) -> Result<()>;

    /// Set `leftover_from_meal_id` for each `(leftover, source)` pair.
    async fn link_leftovers(&self, links: &[(Uuid, Uuid)]) -> Result<()>;

    /// Append usage entries, ignoring ones already stored. Returns the number
    /// added.
    async fn record_usage(&self, household_id: Uuid, entries: &[UsageEntry]) -> Result<u64>;

    /// Store the summary and rollup and mark the plan generated.
    async fn save_summary(&self, plan_id: Uuid, summary: &str, nutrition: &NutritionRollup)
    -> Result<()>;

    async fn mark_failed(&self, plan_id: Uuid) -> Result<()>;
}

// Compile-time assertion: PlanRepository must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanRepository) {}
};
