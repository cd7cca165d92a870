use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use mealplan_db::models::PlanningRules;
use regex::Regex;

use super::{PlacedMeal, ValidationContext, ValidationResult, title};

/// Notes that announce a batch cook.
static BATCH_NOTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bbatch[\s-]*cook|\bdouble\s+(?:batch|portion|recipe)|\b(?:make|cook)\s+extra\b|\bleftovers?\s+for\b",
    )
    .ok()
});

pub(crate) fn mentions_batch_cooking(notes: &str) -> bool {
    BATCH_NOTE.as_ref().is_some_and(|re| re.is_match(notes))
}

/// Every leftover must close over an earlier, freshly cooked meal of the same
/// recipe and meal type within the leftover window.
pub(super) fn check(
    placed: &[PlacedMeal<'_>],
    rules: &PlanningRules,
    ctx: &ValidationContext,
    result: &mut ValidationResult,
) {
    let mut used_sources: HashSet<usize> = HashSet::new();

    for leftover in placed.iter().filter(|m| m.is_leftover && !m.locked) {
        let slot = title(leftover.slot);
        let name = &leftover.recipe.name;
        if !rules.batch_cooking_enabled {
            result.error(format!(
                "{slot} is marked as leftovers but batch cooking is disabled; cook it fresh"
            ));
            continue;
        }

        let earlier: Vec<usize> = placed
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                !m.is_leftover
                    && m.slot.meal_type == leftover.slot.meal_type
                    && m.recipe.id == leftover.recipe.id
                    && m.date < leftover.date
            })
            .map(|(i, _)| i)
            .collect();

        let source = match leftover.source_day {
            Some(day) => {
                let found = earlier.iter().copied().find(|i| placed[*i].slot.day == day);
                if found.is_none() {
                    let day = title(day);
                    result.error(format!(
                        "{slot} is leftovers of \"{name}\" from {day}, but no freshly cooked \
                         \"{name}\" {} is planned on {day} before it",
                        leftover.slot.meal_type
                    ));
                }
                found
            }
            None => match earlier.as_slice() {
                [only] => Some(*only),
                [] => {
                    result.error(format!(
                        "{slot} is leftovers of \"{name}\", but no earlier {} cooks \"{name}\"",
                        leftover.slot.meal_type
                    ));
                    None
                }
                several => {
                    let days: Vec<String> =
                        several.iter().map(|i| title(placed[*i].slot.day)).collect();
                    result.error(format!(
                        "{slot} is leftovers of \"{name}\", which is cooked on {}; \
                         name the day the leftovers come from",
                        days.join(" and ")
                    ));
                    None
                }
            },
        };

        let Some(source) = source else {
            continue;
        };
        used_sources.insert(source);
        let age = (leftover.date - placed[source].date).num_days();
        if age > i64::from(rules.max_leftover_days) {
            result.error(format!(
                "{slot} serves \"{name}\" leftovers from {}, {age} days after cooking; \
                 leftovers may be kept at most {} days",
                title(placed[source].slot.day),
                rules.max_leftover_days
            ));
        }
    }

    if !rules.batch_cooking_enabled {
        return;
    }

    // Batch-cook framing is advisory.
    for (i, meal) in placed.iter().enumerate() {
        if meal.is_leftover || meal.recipe.is_product || ctx.is_exempt(meal.slot.meal_type) {
            continue;
        }
        let announces_batch = meal.notes.is_some_and(mentions_batch_cooking);
        if announces_batch && !used_sources.contains(&i) {
            result.warn(format!(
                "{} mentions batch cooking \"{}\" but no leftover meal uses it",
                title(meal.slot),
                meal.recipe.name
            ));
        }
    }

    let mut cooked: BTreeMap<_, Vec<&PlacedMeal<'_>>> = BTreeMap::new();
    for meal in placed {
        if meal.is_leftover || meal.recipe.is_product || ctx.is_exempt(meal.slot.meal_type) {
            continue;
        }
        cooked
            .entry((meal.slot.meal_type, meal.recipe.id))
            .or_default()
            .push(meal);
    }
    for meals in cooked.values() {
        for pair in meals.windows(2) {
            let gap = (pair[1].date - pair[0].date).num_days();
            if gap > 0 && gap <= i64::from(rules.max_leftover_days) {
                result.warn(format!(
                    "\"{}\" is cooked for {} on {} and again on {}; consider serving {} as leftovers",
                    pair[0].recipe.name,
                    pair[0].slot.meal_type,
                    title(pair[0].slot.day),
                    title(pair[1].slot.day),
                    title(pair[1].slot.day)
                ));
            }
        }
    }
}
