use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use mealplan_db::models::{PlanningRules, UsageEntry};
use uuid::Uuid;

use super::{PlacedMeal, ValidationContext, ValidationResult, describe_date};

/// A recipe may not repeat within its meal type's cooldown. Uses from recent
/// history count; leftovers, ready-made products and exempt meal types do not.
pub(super) fn check(
    placed: &[PlacedMeal<'_>],
    rules: &PlanningRules,
    history: &[UsageEntry],
    ctx: &ValidationContext,
    result: &mut ValidationResult,
) {
    let mut uses: BTreeMap<(_, Uuid), BTreeSet<NaiveDate>> = BTreeMap::new();
    let mut names: BTreeMap<Uuid, &str> = BTreeMap::new();

    for meal in placed {
        let mt = meal.slot.meal_type;
        if meal.is_leftover || meal.recipe.is_product || ctx.is_exempt(mt) || rules.cooldown_for(mt) == 0 {
            continue;
        }
        names.insert(meal.recipe.id, meal.recipe.name.as_str());
        uses.entry((mt, meal.recipe.id)).or_default().insert(meal.date);
    }

    for entry in history {
        if entry.used_on >= ctx.week_start {
            continue;
        }
        if let Some(dates) = uses.get_mut(&(entry.meal_type, entry.recipe_id)) {
            dates.insert(entry.used_on);
        }
    }

    for ((mt, recipe_id), dates) in &uses {
        let cooldown = i64::from(rules.cooldown_for(*mt));
        let name = names.get(recipe_id).copied().unwrap_or("unknown recipe");
        let dates: Vec<NaiveDate> = dates.iter().copied().collect();
        for pair in dates.windows(2) {
            let (previous, current) = (pair[0], pair[1]);
            let gap = (current - previous).num_days();
            if gap < cooldown {
                result.error(format!(
                    "Recipe \"{name}\" is served for {mt} on {}, only {gap} day{} after {}; \
                     {mt} recipes need at least {cooldown} days between uses",
                    describe_date(current, ctx.week_start),
                    if gap == 1 { "" } else { "s" },
                    describe_date(previous, ctx.week_start),
                ));
            }
        }
    }
}
