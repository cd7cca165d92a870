use std::collections::{BTreeSet, HashMap};

use super::{ValidationContext, ValidationResult, title};
use crate::generator::CandidateMeal;

/// One meal per (day, meal type). Colliding with a locked meal is only a
/// warning because the locked meal wins during reconciliation.
pub(super) fn check(meals: &[CandidateMeal], ctx: &ValidationContext, result: &mut ValidationResult) {
    let locked: HashMap<_, _> = ctx
        .locked
        .iter()
        .map(|l| (l.slot, l.recipe_name.as_str()))
        .collect();
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();

    for meal in meals {
        let slot = meal.slot();
        if let Some(locked_name) = locked.get(&slot) {
            result.warn(format!(
                "{} is locked to \"{locked_name}\"; the proposed \"{}\" will be discarded",
                title(slot),
                meal.label()
            ));
            continue;
        }
        if !ctx.is_scheduled(slot) {
            result.warn(format!(
                "{} is not scheduled for anyone; \"{}\" will be removed",
                title(slot),
                meal.label()
            ));
            continue;
        }
        if !seen.insert(slot) && reported.insert(slot) {
            result.error(format!(
                "{} has more than one meal; plan exactly one meal per slot",
                title(slot)
            ));
        }
    }

    for slot in ctx.schedule.slots() {
        if !seen.contains(&slot) && !locked.contains_key(&slot) {
            result.warn(format!("{} is scheduled but has no meal", title(slot)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::plan::LockedMeal;
    use crate::schedule::Schedule;
    use mealplan_db::models::{DayOfWeek, MealSlot, MealType};
    use uuid::Uuid;

    #[test]
    fn duplicate_slot_reported_once() {
        let soup = recipe("Soup", "french", MealType::Dinner, None);
        let meals = vec![
            meal(DayOfWeek::Friday, MealType::Dinner, &soup),
            meal(DayOfWeek::Friday, MealType::Dinner, &soup),
            meal(DayOfWeek::Friday, MealType::Dinner, &soup),
        ];
        let mut result = ValidationResult::default();
        check(&meals, &context(), &mut result);
        assert_eq!(
            result.errors,
            vec!["Friday dinner has more than one meal; plan exactly one meal per slot"]
        );
    }

    #[test]
    fn locked_collision_is_a_warning() {
        let oats = recipe("Oats", "american", MealType::Breakfast, None);
        let eggs = recipe("Eggs", "american", MealType::Breakfast, None);
        let mut ctx = context();
        ctx.locked.push(LockedMeal {
            id: Uuid::new_v4(),
            slot: MealSlot::new(DayOfWeek::Monday, MealType::Breakfast),
            recipe_id: Some(oats.id),
            recipe_name: oats.name.clone(),
            servings: 2,
            scaling_factor: None,
            is_leftover: false,
            notes: None,
        });

        let mut result = ValidationResult::default();
        check(&[meal(DayOfWeek::Monday, MealType::Breakfast, &eggs)], &ctx, &mut result);
        assert!(result.errors.is_empty());
        assert_eq!(
            result.warnings,
            vec!["Monday breakfast is locked to \"Oats\"; the proposed \"Eggs\" will be discarded"]
        );
    }

    #[test]
    fn unscheduled_and_missing_slots_warn() {
        let mut ctx = context();
        ctx.schedule = Schedule::from_profiles(&[person([
            MealSlot::new(DayOfWeek::Monday, MealType::Dinner),
            MealSlot::new(DayOfWeek::Tuesday, MealType::Dinner),
        ])]);
        let chili = recipe("Chili", "mexican", MealType::Dinner, None);

        let mut result = ValidationResult::default();
        check(
            &[
                meal(DayOfWeek::Monday, MealType::Dinner, &chili),
                meal(DayOfWeek::Monday, MealType::Lunch, &chili),
            ],
            &ctx,
            &mut result,
        );
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].starts_with("Monday lunch is not scheduled"));
        assert_eq!(result.warnings[1], "Tuesday dinner is scheduled but has no meal");
    }
}
