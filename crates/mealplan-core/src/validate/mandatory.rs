use std::collections::BTreeSet;

use mealplan_db::models::DayOfWeek;

use super::{PlacedMeal, ValidationContext, ValidationResult, title};

/// Required recipes appear at least once; with daily repetition they appear on
/// every day the schedule serves one of their meal types.
pub(super) fn check(placed: &[PlacedMeal<'_>], ctx: &ValidationContext, result: &mut ValidationResult) {
    for recipe in &ctx.mandatory {
        let uses: Vec<&PlacedMeal<'_>> = placed.iter().filter(|m| m.recipe.id == recipe.id).collect();

        if uses.is_empty() {
            result.error(format!(
                "Required recipe \"{}\" is not in the plan; include it at least once",
                recipe.name
            ));
            continue;
        }
        if !ctx.daily_repetition {
            continue;
        }

        let applicable: BTreeSet<DayOfWeek> = if ctx.schedule.is_empty() {
            DayOfWeek::ALL.into_iter().collect()
        } else {
            ctx.schedule.days_serving(&recipe.meal_types)
        };
        let used_days: BTreeSet<DayOfWeek> = uses.iter().map(|m| m.slot.day).collect();
        let missing: Vec<String> = applicable.difference(&used_days).map(title).collect();
        if !missing.is_empty() {
            result.error(format!(
                "Recipe \"{}\" was requested for every day but only used {} times",
                recipe.name,
                uses.len()
            ));
            result.warn(format!("{} is missing on {}", recipe.name, missing.join(", ")));
        }
    }
}
