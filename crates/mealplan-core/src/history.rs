//! Usage history written after a plan is accepted.

use std::collections::HashSet;

use mealplan_db::models::UsageEntry;

use crate::reconcile::ReconciledMeal;

/// One entry per (date, meal type, recipe) for freshly cooked meals.
/// Leftovers are not new uses.
pub fn synthesize_usage(meals: &[ReconciledMeal]) -> Vec<UsageEntry> {
    let mut seen = HashSet::new();
    meals
        .iter()
        .filter(|m| !m.is_leftover)
        .filter_map(|m| {
            m.recipe_id.map(|recipe_id| UsageEntry {
                recipe_id,
                used_on: m.date,
                meal_type: m.meal_type,
            })
        })
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

/// Add `new` entries to `existing`, skipping ones already present. Returns
/// the number added.
pub fn merge_usage(existing: &mut Vec<UsageEntry>, new: &[UsageEntry]) -> usize {
    let mut present: HashSet<UsageEntry> = existing.iter().cloned().collect();
    let before = existing.len();
    for entry in new {
        if present.insert(entry.clone()) {
            existing.push(entry.clone());
        }
    }
    existing.len() - before
}
