//! Deterministic plan validation.
//!
//! [`validate`] is pure: it reads the candidate, the rules, recent history and
//! the recipe catalog, and reports every violation it finds rather than
//! stopping at the first. Errors reject the plan; warnings are advisory and
//! are carried through to the final result.
//!
//! Checks run in this order, each in its own module:
//!
//! | module       | checks |
//! |--------------|--------|
//! | `slots`      | one meal per slot, locked-slot collisions, unscheduled slots |
//! | `cooldown`   | repeat gaps per meal type, including history |
//! | `cuisine`    | distinct-cuisine minimum and per-cuisine maximum |
//! | `leftovers`  | leftover sources, windows, batch-cook framing |
//! | `mandatory`  | required recipes, daily repetition |
//! | `macros`     | weekly and per-day macro bands |

mod cooldown;
mod cuisine;
mod leftovers;
mod macros;
mod mandatory;
mod slots;

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::NaiveDate;
use mealplan_db::models::{DayOfWeek, Macros, MealSlot, MealType, PlanningRules, Recipe, UsageEntry};
use serde::{Deserialize, Serialize};

use crate::catalog::RecipeCatalog;
use crate::generator::CandidateMeal;
use crate::plan::LockedMeal;
use crate::schedule::Schedule;

/// Outcome of validating one candidate plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Put structural problems ahead of constraint errors.
    pub fn prepend_errors(&mut self, errors: &[String]) {
        if errors.is_empty() {
            return;
        }
        let mut merged = errors.to_vec();
        merged.append(&mut self.errors);
        self.errors = merged;
        self.is_valid = false;
    }

    fn finish(mut self) -> Self {
        self.is_valid = self.errors.is_empty();
        self
    }
}

/// Per-run facts the validator needs besides the rules.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    pub week_start: NaiveDate,
    /// Who eats which slot. An empty schedule treats every slot as eaten.
    pub schedule: Schedule,
    pub locked: Vec<LockedMeal>,
    /// Meal types exempt from cooldowns and batch-cook expectations.
    pub exempt_meal_types: BTreeSet<MealType>,
    /// Required recipes, exclusions already removed.
    pub mandatory: Vec<Recipe>,
    /// Mandatory recipes must appear on every applicable day.
    pub daily_repetition: bool,
    /// Household daily targets; `None` disables macro checks.
    pub macro_targets: Option<Macros>,
}

impl ValidationContext {
    pub fn new(week_start: NaiveDate) -> Self {
        Self {
            week_start,
            schedule: Schedule::default(),
            locked: Vec::new(),
            exempt_meal_types: BTreeSet::new(),
            mandatory: Vec::new(),
            daily_repetition: false,
            macro_targets: None,
        }
    }

    fn is_exempt(&self, meal_type: MealType) -> bool {
        self.exempt_meal_types.contains(&meal_type)
    }

    fn is_scheduled(&self, slot: MealSlot) -> bool {
        self.schedule.is_empty() || self.schedule.eaters(slot) > 0
    }
}

/// Validate `meals` against every constraint and collect all violations.
pub fn validate(
    meals: &[CandidateMeal],
    rules: &PlanningRules,
    history: &[UsageEntry],
    catalog: &RecipeCatalog,
    ctx: &ValidationContext,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    slots::check(meals, ctx, &mut result);
    let placed = place_meals(meals, catalog, ctx, &mut result);

    cooldown::check(&placed, rules, history, ctx, &mut result);
    cuisine::check(&placed, rules, catalog, &mut result);
    leftovers::check(&placed, rules, ctx, &mut result);
    mandatory::check(&placed, ctx, &mut result);
    macros::check(&placed, rules, ctx, &mut result);

    result.finish()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A meal that will actually be served: recipe resolved, date known.
#[derive(Debug, Clone)]
struct PlacedMeal<'a> {
    slot: MealSlot,
    date: NaiveDate,
    recipe: &'a Recipe,
    is_leftover: bool,
    source_day: Option<DayOfWeek>,
    notes: Option<&'a str>,
    locked: bool,
}

/// Resolve recipes and merge in locked meals. Meals the reconciler would
/// discard (unknown recipe, locked or duplicate slot, nobody eating) are left
/// out so every check sees the plan that will be stored.
fn place_meals<'a>(
    meals: &'a [CandidateMeal],
    catalog: &'a RecipeCatalog,
    ctx: &'a ValidationContext,
    result: &mut ValidationResult,
) -> Vec<PlacedMeal<'a>> {
    let locked_slots: HashSet<MealSlot> = ctx.locked.iter().map(|l| l.slot).collect();
    let mut taken = HashSet::new();
    let mut placed = Vec::with_capacity(meals.len() + ctx.locked.len());

    for locked in &ctx.locked {
        let Some(recipe) = catalog.resolve(locked.recipe_id, Some(&locked.recipe_name)) else {
            continue;
        };
        placed.push(PlacedMeal {
            slot: locked.slot,
            date: locked.slot.day.date_in_week(ctx.week_start),
            recipe,
            is_leftover: locked.is_leftover,
            source_day: None,
            notes: locked.notes.as_deref(),
            locked: true,
        });
    }

    for meal in meals {
        let slot = meal.slot();
        if locked_slots.contains(&slot) || !ctx.is_scheduled(slot) || !taken.insert(slot) {
            continue;
        }
        let Some(recipe) = catalog.resolve(meal.recipe_id, meal.recipe_name.as_deref()) else {
            result.warn(format!(
                "{} uses \"{}\", which is not in the recipe library; it will be removed",
                title(slot),
                meal.label()
            ));
            continue;
        };
        placed.push(PlacedMeal {
            slot,
            date: slot.day.date_in_week(ctx.week_start),
            recipe,
            is_leftover: meal.is_leftover,
            source_day: meal.leftover_source_day,
            notes: meal.notes.as_deref(),
            locked: false,
        });
    }

    placed.sort_by_key(|p| (p.date, p.slot.meal_type));
    placed
}

/// Capitalize the first letter of a displayed value ("Monday dinner").
fn title(value: impl fmt::Display) -> String {
    let text = value.to_string();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

/// Describe a date relative to the plan week: the weekday inside it, the
/// calendar date outside it.
fn describe_date(date: NaiveDate, week_start: NaiveDate) -> String {
    let offset = (date - week_start).num_days();
    if (0..7).contains(&offset) {
        title(DayOfWeek::from_weekday(chrono::Datelike::weekday(&date)))
    } else {
        format!("{} (recent history)", date.format("%Y-%m-%d"))
    }
}

// ---------------------------------------------------------------------------
// Shared test fixtures
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use mealplan_db::models::Profile;
    use uuid::Uuid;

    /// 2026-10-19, a Monday.
    pub fn week_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    pub fn recipe(name: &str, cuisine: &str, meal_type: MealType, kcal: Option<f64>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            cuisine: Some(cuisine.to_owned()),
            meal_types: vec![meal_type],
            servings: 4,
            is_product: false,
            nutrition: Macros {
                calories: kcal,
                ..Macros::default()
            },
        }
    }

    pub fn meal(day: DayOfWeek, meal_type: MealType, recipe: &Recipe) -> CandidateMeal {
        CandidateMeal::new(day, meal_type, recipe.name.clone()).with_recipe_id(recipe.id)
    }

    pub fn person(slots: impl IntoIterator<Item = MealSlot>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            name: "Sam".to_owned(),
            daily_targets: Macros::default(),
            slots: slots.into_iter().collect(),
            dietary_notes: None,
        }
    }

    /// Rules with every optional constraint switched off.
    pub fn lax_rules() -> PlanningRules {
        PlanningRules {
            cooldown_days: Default::default(),
            min_cuisines: 0,
            max_same_cuisine: 0,
            batch_cooking_enabled: true,
            max_leftover_days: 3,
            macro_mode: Default::default(),
            priorities: Vec::new(),
        }
    }

    pub fn context() -> ValidationContext {
        ValidationContext::new(week_start())
    }
}
