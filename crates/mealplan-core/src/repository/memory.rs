//! In-process [`PlanRepository`] for tests and runs without a database.

use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use mealplan_db::models::{PlanStatus, PlanningRules, Profile, Recipe, UsageEntry};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::PlanRepository;
use crate::history::merge_usage;
use crate::plan::LockedMeal;
use crate::reconcile::{self, NutritionRollup, ReconciledMeal};

/// A stored plan as the in-memory repository sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlan {
    pub id: Uuid,
    pub household_id: Uuid,
    pub week_start: NaiveDate,
    pub status: PlanStatus,
    pub summary: Option<String>,
    pub nutrition: Option<NutritionRollup>,
    pub meals: Vec<ReconciledMeal>,
}

#[derive(Debug, Default)]
struct Household {
    profiles: Vec<Profile>,
    recipes: Vec<Recipe>,
    rules: Option<PlanningRules>,
    usage: Vec<UsageEntry>,
}

#[derive(Debug, Default)]
struct State {
    households: HashMap<Uuid, Household>,
    plans: HashMap<Uuid, StoredPlan>,
}

impl State {
    fn household(&mut self, id: Uuid) -> &mut Household {
        self.households.entry(id).or_default()
    }

    fn plan_id(&mut self, household_id: Uuid, week_start: NaiveDate) -> Uuid {
        if let Some(plan) = self
            .plans
            .values()
            .find(|p| p.household_id == household_id && p.week_start == week_start)
        {
            return plan.id;
        }
        let id = Uuid::new_v4();
        self.plans.insert(
            id,
            StoredPlan {
                id,
                household_id,
                week_start,
                status: PlanStatus::Draft,
                summary: None,
                nutrition: None,
                meals: Vec::new(),
            },
        );
        id
    }

    fn plan_mut(&mut self, plan_id: Uuid) -> Result<&mut StoredPlan> {
        match self.plans.get_mut(&plan_id) {
            Some(plan) => Ok(plan),
            None => bail!("meal plan {plan_id} not found"),
        }
    }
}

/// Households, recipes and plans held behind a mutex.
///
/// The `with_*` builders seed data before the repository is shared; the
/// async accessors read back what the service stored.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(mut self, household_id: Uuid, profiles: Vec<Profile>) -> Self {
        self.state.get_mut().household(household_id).profiles = profiles;
        self
    }

    pub fn with_recipes(mut self, household_id: Uuid, recipes: Vec<Recipe>) -> Self {
        self.state.get_mut().household(household_id).recipes = recipes;
        self
    }

    pub fn with_rules(mut self, household_id: Uuid, rules: PlanningRules) -> Self {
        self.state.get_mut().household(household_id).rules = Some(rules);
        self
    }

    pub fn with_history(mut self, household_id: Uuid, entries: Vec<UsageEntry>) -> Self {
        let household = self.state.get_mut().household(household_id);
        merge_usage(&mut household.usage, &entries);
        self
    }

    /// Pin a meal in the household's plan for `week_start`, creating the
    /// plan if needed. Returns the plan id.
    pub fn with_locked_meal(
        mut self,
        household_id: Uuid,
        week_start: NaiveDate,
        meal: LockedMeal,
    ) -> (Self, Uuid) {
        let state = self.state.get_mut();
        let plan_id = state.plan_id(household_id, week_start);
        if let Some(plan) = state.plans.get_mut(&plan_id) {
            plan.meals.push(reconcile::from_locked(&meal, week_start));
        }
        (self, plan_id)
    }

    pub async fn plan(&self, plan_id: Uuid) -> Option<StoredPlan> {
        self.state.lock().await.plans.get(&plan_id).cloned()
    }

    pub async fn find_plan(&self, household_id: Uuid, week_start: NaiveDate) -> Option<StoredPlan> {
        self.state
            .lock()
            .await
            .plans
            .values()
            .find(|p| p.household_id == household_id && p.week_start == week_start)
            .cloned()
    }

    pub async fn usage(&self, household_id: Uuid) -> Vec<UsageEntry> {
        self.state
            .lock()
            .await
            .households
            .get(&household_id)
            .map(|h| h.usage.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PlanRepository for InMemoryRepository {
    async fn load_profiles(&self, household_id: Uuid) -> Result<Vec<Profile>> {
        let mut state = self.state.lock().await;
        Ok(state.household(household_id).profiles.clone())
    }

    async fn load_recipes(&self, household_id: Uuid, limit: i64) -> Result<Vec<Recipe>> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let mut state = self.state.lock().await;
        Ok(state
            .household(household_id)
            .recipes
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn load_recipes_by_ids(&self, household_id: Uuid, ids: &[Uuid]) -> Result<Vec<Recipe>> {
        let mut state = self.state.lock().await;
        Ok(state
            .household(household_id)
            .recipes
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn load_rules(&self, household_id: Uuid) -> Result<Option<PlanningRules>> {
        let mut state = self.state.lock().await;
        Ok(state.household(household_id).rules.clone())
    }

    async fn load_history(
        &self,
        household_id: Uuid,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<UsageEntry>> {
        let mut state = self.state.lock().await;
        let mut entries: Vec<UsageEntry> = state
            .household(household_id)
            .usage
            .iter()
            .filter(|e| e.used_on >= since && e.used_on < until)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.used_on);
        Ok(entries)
    }

    async fn ensure_plan(&self, household_id: Uuid, week_start: NaiveDate) -> Result<Uuid> {
        Ok(self.state.lock().await.plan_id(household_id, week_start))
    }

    async fn load_locked_meals(&self, plan_id: Uuid) -> Result<Vec<LockedMeal>> {
        let state = self.state.lock().await;
        let Some(plan) = state.plans.get(&plan_id) else {
            return Ok(Vec::new());
        };
        Ok(plan
            .meals
            .iter()
            .filter(|m| m.locked)
            .map(|m| LockedMeal {
                id: m.id,
                slot: m.slot(),
                recipe_id: m.recipe_id,
                recipe_name: m.recipe_name.clone(),
                servings: m.servings,
                scaling_factor: m.scaling_factor,
                is_leftover: m.is_leftover,
                notes: m.notes.clone(),
            })
            .collect())
    }

    async fn save_meals(&self, plan_id: Uuid, meals: &[ReconciledMeal]) -> Result<()> {
        let mut state = self.state.lock().await;
        let plan = state.plan_mut(plan_id)?;
        plan.meals.retain(|m| m.locked);
        plan.meals.extend(meals.iter().filter(|m| !m.locked).cloned());
        plan.meals.sort_by_key(|m| (m.date, m.meal_type));
        Ok(())
    }

    async fn link_leftovers(&self, links: &[(Uuid, Uuid)]) -> Result<()> {
        let mut state = self.state.lock().await;
        for (leftover_id, source_id) in links {
            let Some(meal) = state
                .plans
                .values_mut()
                .flat_map(|p| p.meals.iter_mut())
                .find(|m| m.id == *leftover_id)
            else {
                bail!("leftover meal {leftover_id} not found");
            };
            meal.leftover_from_meal_id = Some(*source_id);
            meal.batch_cook_source_day = None;
        }
        Ok(())
    }

    async fn record_usage(&self, household_id: Uuid, entries: &[UsageEntry]) -> Result<u64> {
        let mut state = self.state.lock().await;
        let added = merge_usage(&mut state.household(household_id).usage, entries);
        Ok(u64::try_from(added).unwrap_or(u64::MAX))
    }

    async fn save_summary(
        &self,
        plan_id: Uuid,
        summary: &str,
        nutrition: &NutritionRollup,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let plan = state.plan_mut(plan_id)?;
        plan.summary = Some(summary.to_owned());
        plan.nutrition = Some(*nutrition);
        plan.status = PlanStatus::Generated;
        Ok(())
    }

    async fn mark_failed(&self, plan_id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        state.plan_mut(plan_id)?.status = PlanStatus::Failed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealplan_db::models::{DayOfWeek, MealSlot, MealType};

    fn week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn locked_breakfast() -> LockedMeal {
        LockedMeal {
            id: Uuid::new_v4(),
            slot: MealSlot::new(DayOfWeek::Monday, MealType::Breakfast),
            recipe_id: Some(Uuid::new_v4()),
            recipe_name: "Porridge".to_owned(),
            servings: 2,
            scaling_factor: Some(1.0),
            is_leftover: false,
            notes: None,
        }
    }

    fn generated(day: DayOfWeek, is_leftover: bool) -> ReconciledMeal {
        ReconciledMeal {
            id: Uuid::new_v4(),
            day,
            date: day.date_in_week(week()),
            meal_type: MealType::Dinner,
            recipe_id: Some(Uuid::new_v4()),
            recipe_name: "Chili".to_owned(),
            servings: 2,
            scaling_factor: Some(0.5),
            is_leftover,
            leftover_from_meal_id: None,
            batch_cook_source_day: is_leftover.then_some(DayOfWeek::Monday),
            notes: None,
            locked: false,
        }
    }

    #[tokio::test]
    async fn ensure_plan_is_stable_per_week() {
        let repo = InMemoryRepository::new();
        let household = Uuid::new_v4();
        let first = repo.ensure_plan(household, week()).await.unwrap();
        let second = repo.ensure_plan(household, week()).await.unwrap();
        assert_eq!(first, second);

        let plan = repo.plan(first).await.unwrap();
        assert_eq!(plan.status, PlanStatus::Draft);
    }

    #[tokio::test]
    async fn save_meals_keeps_locked_meals() {
        let household = Uuid::new_v4();
        let locked = locked_breakfast();
        let (repo, plan_id) =
            InMemoryRepository::new().with_locked_meal(household, week(), locked.clone());

        let loaded = repo.load_locked_meals(plan_id).await.unwrap();
        assert_eq!(loaded, vec![locked.clone()]);

        repo.save_meals(plan_id, &[generated(DayOfWeek::Monday, false)])
            .await
            .unwrap();
        repo.save_meals(plan_id, &[generated(DayOfWeek::Tuesday, false)])
            .await
            .unwrap();

        let plan = repo.plan(plan_id).await.unwrap();
        assert_eq!(plan.meals.len(), 2);
        assert!(plan.meals.iter().any(|m| m.id == locked.id && m.locked));
        assert!(plan.meals.iter().any(|m| m.day == DayOfWeek::Tuesday));
    }

    #[tokio::test]
    async fn link_leftovers_sets_source_and_clears_day() {
        let repo = InMemoryRepository::new();
        let plan_id = repo.ensure_plan(Uuid::new_v4(), week()).await.unwrap();
        let source = generated(DayOfWeek::Monday, false);
        let leftover = generated(DayOfWeek::Tuesday, true);
        repo.save_meals(plan_id, &[source.clone(), leftover.clone()])
            .await
            .unwrap();

        repo.link_leftovers(&[(leftover.id, source.id)]).await.unwrap();

        let plan = repo.plan(plan_id).await.unwrap();
        let stored = plan.meals.iter().find(|m| m.id == leftover.id).unwrap();
        assert_eq!(stored.leftover_from_meal_id, Some(source.id));
        assert_eq!(stored.batch_cook_source_day, None);
    }

    #[tokio::test]
    async fn link_to_unknown_meal_fails() {
        let repo = InMemoryRepository::new();
        let err = repo
            .link_leftovers(&[(Uuid::new_v4(), Uuid::new_v4())])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn history_window_is_half_open() {
        let household = Uuid::new_v4();
        let recipe_id = Uuid::new_v4();
        let entry = |day: u32| UsageEntry {
            recipe_id,
            used_on: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            meal_type: MealType::Dinner,
        };
        let repo = InMemoryRepository::new()
            .with_history(household, vec![entry(12), entry(18), entry(19)]);

        let history = repo
            .load_history(household, NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(), week())
            .await
            .unwrap();
        assert_eq!(history, vec![entry(12), entry(18)]);

        assert_eq!(repo.record_usage(household, &[entry(18), entry(20)]).await.unwrap(), 1);
        assert_eq!(repo.usage(household).await.len(), 4);
    }

    #[tokio::test]
    async fn summary_and_failure_update_status() {
        let repo = InMemoryRepository::new();
        let plan_id = repo.ensure_plan(Uuid::new_v4(), week()).await.unwrap();

        repo.save_summary(plan_id, "A week of soups.", &NutritionRollup::default())
            .await
            .unwrap();
        let plan = repo.plan(plan_id).await.unwrap();
        assert_eq!(plan.status, PlanStatus::Generated);
        assert_eq!(plan.summary.as_deref(), Some("A week of soups."));

        repo.mark_failed(plan_id).await.unwrap();
        assert_eq!(repo.plan(plan_id).await.unwrap().status, PlanStatus::Failed);
        assert!(repo.mark_failed(Uuid::new_v4()).await.is_err());
    }
}
