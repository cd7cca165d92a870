//! Turning an accepted candidate into the plan that gets stored.
//!
//! Steps, in order:
//! 1. drop meals whose recipe is not in the catalog,
//! 2. keep locked meals and discard candidates on their slots,
//! 3. set servings from the schedule (slots nobody eats are dropped),
//! 4. link leftovers to their source meals by id,
//! 5. roll up nutrition ([`nutrition`]),
//! 6. correct the generator's summary against the rollup ([`summary`]).

pub mod nutrition;
pub mod summary;

use std::collections::HashSet;

use chrono::NaiveDate;
use mealplan_db::models::{DayOfWeek, MealSlot, MealType};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::RecipeCatalog;
use crate::generator::CandidateMeal;
use crate::plan::LockedMeal;
use crate::schedule::Schedule;

pub use nutrition::NutritionRollup;

/// A meal ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledMeal {
    pub id: Uuid,
    pub day: DayOfWeek,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe_id: Option<Uuid>,
    pub recipe_name: String,
    pub servings: u32,
    /// `servings / recipe servings`, or `None` without a recipe.
    pub scaling_factor: Option<f64>,
    pub is_leftover: bool,
    pub leftover_from_meal_id: Option<Uuid>,
    /// Source day as named by the generator; cleared once linked.
    pub batch_cook_source_day: Option<DayOfWeek>,
    pub notes: Option<String>,
    pub locked: bool,
}

impl ReconciledMeal {
    pub fn slot(&self) -> MealSlot {
        MealSlot::new(self.day, self.meal_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledPlan {
    /// Sorted by date, then meal type.
    pub meals: Vec<ReconciledMeal>,
    pub nutrition: NutritionRollup,
    pub summary: String,
    pub warnings: Vec<String>,
}

impl ReconciledPlan {
    /// `(leftover id, source id)` pairs for newly generated leftovers.
    pub fn leftover_links(&self) -> Vec<(Uuid, Uuid)> {
        self.meals
            .iter()
            .filter(|m| !m.locked)
            .filter_map(|m| m.leftover_from_meal_id.map(|source| (m.id, source)))
            .collect()
    }

    /// Meals generated in this run (everything but locked meals).
    pub fn generated_meals(&self) -> impl Iterator<Item = &ReconciledMeal> {
        self.meals.iter().filter(|m| !m.locked)
    }
}

pub struct ReconcileInput<'a> {
    pub meals: &'a [CandidateMeal],
    pub summary: &'a str,
    pub catalog: &'a RecipeCatalog,
    pub schedule: &'a Schedule,
    pub locked: &'a [LockedMeal],
    pub week_start: NaiveDate,
}

pub fn reconcile(input: &ReconcileInput<'_>) -> ReconciledPlan {
    let mut warnings = Vec::new();
    let mut meals: Vec<ReconciledMeal> = input
        .locked
        .iter()
        .map(|locked| from_locked(locked, input.week_start))
        .collect();
    let mut taken: HashSet<MealSlot> = meals.iter().map(ReconciledMeal::slot).collect();
    let locked_slots = taken.clone();

    for candidate in input.meals {
        let slot = candidate.slot();

        let Some(recipe) = input
            .catalog
            .resolve(candidate.recipe_id, candidate.recipe_name.as_deref())
        else {
            warnings.push(format!(
                "Removed {slot}: \"{}\" is not in the recipe library",
                candidate.label()
            ));
            continue;
        };

        if locked_slots.contains(&slot) {
            warnings.push(format!("Kept the locked meal for {slot}; discarded \"{}\"", recipe.name));
            continue;
        }
        if !taken.insert(slot) {
            warnings.push(format!("Removed a second meal for {slot} (\"{}\")", recipe.name));
            continue;
        }

        let eaters = input.schedule.eaters(slot);
        if eaters == 0 {
            warnings.push(format!("Removed {slot}: nobody is scheduled to eat it"));
            continue;
        }
        let servings = u32::try_from(eaters).unwrap_or(u32::MAX);

        meals.push(ReconciledMeal {
            id: Uuid::new_v4(),
            day: slot.day,
            date: slot.day.date_in_week(input.week_start),
            meal_type: slot.meal_type,
            recipe_id: Some(recipe.id),
            recipe_name: recipe.name.clone(),
            servings,
            scaling_factor: Some(f64::from(servings) / f64::from(recipe.servings.max(1))),
            is_leftover: candidate.is_leftover,
            leftover_from_meal_id: None,
            batch_cook_source_day: candidate.leftover_source_day,
            notes: candidate.notes.clone(),
            locked: false,
        });
    }

    meals.sort_by_key(|m| (m.date, m.meal_type));
    link_leftovers(&mut meals, &mut warnings);

    let nutrition = NutritionRollup::from_meals(&meals, input.catalog);
    let summary = summary::correct_summary(input.summary, &nutrition);

    debug!(
        meals = meals.len(),
        warnings = warnings.len(),
        coverage_pct = nutrition.coverage_pct,
        "plan reconciled"
    );

    ReconciledPlan {
        meals,
        nutrition,
        summary,
        warnings,
    }
}

pub(crate) fn from_locked(locked: &LockedMeal, week_start: NaiveDate) -> ReconciledMeal {
    ReconciledMeal {
        id: locked.id,
        day: locked.slot.day,
        date: locked.slot.day.date_in_week(week_start),
        meal_type: locked.slot.meal_type,
        recipe_id: locked.recipe_id,
        recipe_name: locked.recipe_name.clone(),
        servings: locked.servings,
        scaling_factor: locked.scaling_factor,
        is_leftover: locked.is_leftover,
        leftover_from_meal_id: None,
        batch_cook_source_day: None,
        notes: locked.notes.clone(),
        locked: true,
    }
}

/// Link each generated leftover to the meal it comes from: the named source
/// day when given, otherwise the latest earlier cook of the same recipe and
/// meal type. Leftovers without a source become freshly cooked meals.
fn link_leftovers(meals: &mut [ReconciledMeal], warnings: &mut Vec<String>) {
    for i in 0..meals.len() {
        if !meals[i].is_leftover || meals[i].locked {
            continue;
        }
        let leftover = &meals[i];
        let source = meals
            .iter()
            .filter(|m| {
                !m.is_leftover
                    && m.meal_type == leftover.meal_type
                    && m.recipe_id.is_some()
                    && m.recipe_id == leftover.recipe_id
                    && m.date < leftover.date
            })
            .filter(|m| leftover.batch_cook_source_day.is_none_or(|day| m.day == day))
            .max_by_key(|m| m.date)
            .map(|m| m.id);

        let meal = &mut meals[i];
        match source {
            Some(source_id) => {
                meal.leftover_from_meal_id = Some(source_id);
                meal.batch_cook_source_day = None;
            }
            None => {
                warnings.push(format!(
                    "Leftovers for {} (\"{}\") have no source meal; they will be cooked fresh",
                    meal.slot(),
                    meal.recipe_name
                ));
                meal.is_leftover = false;
                meal.batch_cook_source_day = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealplan_db::models::{Macros, Profile, Recipe};

    fn week_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn recipe(name: &str, servings: u32, kcal: Option<f64>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            cuisine: None,
            meal_types: vec![MealType::Dinner],
            servings,
            is_product: false,
            nutrition: Macros {
                calories: kcal,
                ..Macros::default()
            },
        }
    }

    fn household(dinners: &[DayOfWeek], people: usize) -> Schedule {
        let slots: Vec<MealSlot> = dinners
            .iter()
            .map(|d| MealSlot::new(*d, MealType::Dinner))
            .collect();
        let profiles: Vec<Profile> = (0..people)
            .map(|i| Profile {
                id: Uuid::new_v4(),
                name: format!("P{i}"),
                daily_targets: Macros::default(),
                slots: slots.clone(),
                dietary_notes: None,
            })
            .collect();
        Schedule::from_profiles(&profiles)
    }

    fn run(
        meals: &[CandidateMeal],
        catalog: &RecipeCatalog,
        schedule: &Schedule,
        locked: &[LockedMeal],
    ) -> ReconciledPlan {
        reconcile(&ReconcileInput {
            meals,
            summary: "",
            catalog,
            schedule,
            locked,
            week_start: week_start(),
        })
    }

    #[test]
    fn unknown_recipes_are_dropped_not_nulled() {
        let chili = recipe("Chili", 4, None);
        let catalog = RecipeCatalog::new([chili.clone()]);
        let schedule = household(&[DayOfWeek::Monday, DayOfWeek::Tuesday], 1);
        let meals = vec![
            CandidateMeal::new(DayOfWeek::Monday, MealType::Dinner, "Chili"),
            CandidateMeal::new(DayOfWeek::Tuesday, MealType::Dinner, "Unicorn Pie")
                .with_recipe_id(Uuid::new_v4()),
        ];
        let plan = run(&meals, &catalog, &schedule, &[]);
        assert_eq!(plan.meals.len(), 1);
        assert_eq!(plan.meals[0].recipe_id, Some(chili.id));
        assert!(plan.meals.iter().all(|m| m.recipe_id.is_some()));
        assert!(plan.warnings[0].contains("Unicorn Pie"));
    }

    #[test]
    fn servings_follow_schedule_and_scale() {
        let chili = recipe("Chili", 4, None);
        let catalog = RecipeCatalog::new([chili.clone()]);
        let schedule = household(&[DayOfWeek::Monday], 3);
        let meals = vec![
            CandidateMeal::new(DayOfWeek::Monday, MealType::Dinner, "Chili"),
            CandidateMeal::new(DayOfWeek::Saturday, MealType::Dinner, "Chili"),
        ];
        let plan = run(&meals, &catalog, &schedule, &[]);
        assert_eq!(plan.meals.len(), 1);
        assert_eq!(plan.meals[0].servings, 3);
        assert_eq!(plan.meals[0].scaling_factor, Some(0.75));
        assert!(plan.warnings[0].contains("nobody is scheduled"));
    }

    #[test]
    fn locked_meal_survives_and_wins_its_slot() {
        let chili = recipe("Chili", 4, None);
        let stew = recipe("Stew", 4, None);
        let catalog = RecipeCatalog::new([chili.clone(), stew.clone()]);
        let schedule = household(&[DayOfWeek::Monday], 2);
        let locked = LockedMeal {
            id: Uuid::new_v4(),
            slot: MealSlot::new(DayOfWeek::Monday, MealType::Dinner),
            recipe_id: Some(stew.id),
            recipe_name: "Stew".to_owned(),
            servings: 5,
            scaling_factor: Some(1.25),
            is_leftover: false,
            notes: None,
        };
        let meals = vec![CandidateMeal::new(DayOfWeek::Monday, MealType::Dinner, "Chili")];
        let plan = run(&meals, &catalog, &schedule, std::slice::from_ref(&locked));

        assert_eq!(plan.meals.len(), 1);
        let kept = &plan.meals[0];
        assert_eq!(kept.id, locked.id);
        assert!(kept.locked);
        assert_eq!(kept.servings, 5);
        assert_eq!(plan.generated_meals().count(), 0);
    }

    #[test]
    fn leftovers_link_by_id() {
        let chili = recipe("Chili", 6, None);
        let catalog = RecipeCatalog::new([chili.clone()]);
        let schedule = household(&[DayOfWeek::Monday, DayOfWeek::Wednesday], 2);
        let meals = vec![
            CandidateMeal::new(DayOfWeek::Monday, MealType::Dinner, "Chili"),
            CandidateMeal::new(DayOfWeek::Wednesday, MealType::Dinner, "Chili")
                .leftover_of(Some(DayOfWeek::Monday)),
        ];
        let plan = run(&meals, &catalog, &schedule, &[]);
        let source = &plan.meals[0];
        let leftover = &plan.meals[1];
        assert_eq!(leftover.leftover_from_meal_id, Some(source.id));
        assert_eq!(leftover.batch_cook_source_day, None);
        assert_eq!(plan.leftover_links(), vec![(leftover.id, source.id)]);

        // Every link points at a meal in the plan.
        let ids: HashSet<Uuid> = plan.meals.iter().map(|m| m.id).collect();
        assert!(plan
            .meals
            .iter()
            .filter_map(|m| m.leftover_from_meal_id)
            .all(|id| ids.contains(&id)));
    }

    #[test]
    fn orphaned_leftover_is_cooked_fresh() {
        let chili = recipe("Chili", 6, None);
        let catalog = RecipeCatalog::new([chili.clone()]);
        // Monday dinner is not scheduled, so the source is dropped.
        let schedule = household(&[DayOfWeek::Wednesday], 1);
        let meals = vec![
            CandidateMeal::new(DayOfWeek::Monday, MealType::Dinner, "Chili"),
            CandidateMeal::new(DayOfWeek::Wednesday, MealType::Dinner, "Chili")
                .leftover_of(Some(DayOfWeek::Monday)),
        ];
        let plan = run(&meals, &catalog, &schedule, &[]);
        assert_eq!(plan.meals.len(), 1);
        assert!(!plan.meals[0].is_leftover);
        assert!(plan.warnings.iter().any(|w| w.contains("cooked fresh")));
    }
}
