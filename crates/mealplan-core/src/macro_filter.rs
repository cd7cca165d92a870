//! Pre-generation macro feasibility filter.
//!
//! Drops recipes whose per-serving nutrition cannot fit the slot they would
//! fill, so the generator is never offered them. The filter never fails: a
//! meal type left with no candidates keeps its full recipe list.

use std::collections::BTreeSet;

use mealplan_db::models::{Macro, MacroMode, Macros, MealType, Recipe};

use crate::policy;

/// Number of removed recipes named in the rationale.
const RATIONALE_NAME_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<Recipe>,
    pub removed: Vec<Recipe>,
    /// Human-readable explanation, appended to the generator instructions.
    pub rationale: String,
}

/// Macros the filter checks: calories always, plus protein, carbs and fat
/// when ranked above "variety".
pub fn checked_macros(priorities: &[String]) -> Vec<Macro> {
    let mut checked = vec![Macro::Calories];
    for priority in priorities {
        if priority.trim().eq_ignore_ascii_case("variety") {
            break;
        }
        if let Some(m) = Macro::from_priority(priority) {
            if !checked.contains(&m) {
                checked.push(m);
            }
        }
    }
    checked
}

/// Split `recipes` into those that can fit the household's daily targets and
/// those that cannot.
///
/// `meal_types` lists the meal types present in the schedule; recipes are
/// judged against the slots they could actually fill.
pub fn filter(
    recipes: &[Recipe],
    targets: &Macros,
    mode: MacroMode,
    priorities: &[String],
    snack_present: bool,
    meal_types: &BTreeSet<MealType>,
) -> FilterOutcome {
    let checked: Vec<Macro> = checked_macros(priorities)
        .into_iter()
        .filter(|m| targets.get(*m).is_some_and(|t| t > 0.0))
        .collect();
    if checked.is_empty() {
        return FilterOutcome {
            kept: recipes.to_vec(),
            removed: Vec::new(),
            rationale: "No macro targets are set; the recipe pool was not filtered.".to_owned(),
        };
    }

    let variance = policy::tolerance(mode).filter_variance;
    let (mut kept, mut removed): (Vec<Recipe>, Vec<Recipe>) = recipes
        .iter()
        .cloned()
        .partition(|r| feasible(r, targets, &checked, variance, snack_present, meal_types));

    let mut restored = Vec::new();
    for mt in meal_types {
        if kept.iter().any(|r| r.applies_to(*mt)) || !removed.iter().any(|r| r.applies_to(*mt)) {
            continue;
        }
        let (back, still_removed): (Vec<Recipe>, Vec<Recipe>) =
            removed.into_iter().partition(|r| r.applies_to(*mt));
        restored.push((*mt, back.len()));
        kept.extend(back);
        removed = still_removed;
    }

    let rationale = rationale(&kept, &removed, &restored, targets, &checked, mode);
    FilterOutcome {
        kept,
        removed,
        rationale,
    }
}

fn feasible(
    recipe: &Recipe,
    targets: &Macros,
    checked: &[Macro],
    variance: f64,
    snack_present: bool,
    meal_types: &BTreeSet<MealType>,
) -> bool {
    if recipe.nutrition.calories.is_none() {
        return true;
    }
    let mut candidates: Vec<MealType> = if recipe.meal_types.is_empty() {
        MealType::ALL.to_vec()
    } else {
        recipe.meal_types.clone()
    };
    let scheduled: Vec<MealType> = candidates
        .iter()
        .copied()
        .filter(|mt| meal_types.contains(mt))
        .collect();
    if !scheduled.is_empty() {
        candidates = scheduled;
    }

    candidates.iter().any(|mt| {
        let share = policy::slot_share(*mt, snack_present);
        checked.iter().all(|m| {
            let (Some(target), Some(value)) = (targets.get(*m), recipe.nutrition.get(*m)) else {
                return true;
            };
            let expected = target * share;
            let low = (expected * (1.0 - variance)).max(0.0);
            let high = expected * (1.0 + variance);
            (low..=high).contains(&value)
        })
    })
}

fn rationale(
    kept: &[Recipe],
    removed: &[Recipe],
    restored: &[(MealType, usize)],
    targets: &Macros,
    checked: &[Macro],
    mode: MacroMode,
) -> String {
    let target_text: Vec<String> = checked
        .iter()
        .filter_map(|m| targets.get(*m).map(|t| format!("{t:.0} {} {}", m.unit(), m.name())))
        .collect();
    let mut text = format!(
        "Macro filter ({mode} mode, daily target {}): kept {} of {} recipes.",
        target_text.join(", "),
        kept.len(),
        kept.len() + removed.len()
    );

    if !removed.is_empty() {
        let mut names: Vec<String> = removed
            .iter()
            .take(RATIONALE_NAME_LIMIT)
            .map(|r| match r.nutrition.calories {
                Some(kcal) => format!("{} ({kcal:.0} kcal)", r.name),
                None => r.name.clone(),
            })
            .collect();
        if removed.len() > RATIONALE_NAME_LIMIT {
            names.push(format!("and {} more", removed.len() - RATIONALE_NAME_LIMIT));
        }
        text.push_str(&format!(
            " Removed because a serving cannot fit any slot: {}.",
            names.join(", ")
        ));
    }

    for (mt, count) in restored {
        text.push_str(&format!(
            " No {mt} recipe fits the targets, so all {count} {mt} recipe{} were kept unfiltered.",
            if *count == 1 { "" } else { "s" }
        ));
    }
    text
}
