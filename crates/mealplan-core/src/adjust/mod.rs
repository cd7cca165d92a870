//! Cooldown adjustment for repetition requests.
//!
//! Requests such as "oatmeal every day" or "tacos on monday and thursday"
//! contradict the household's cooldowns. Before generation, [`adjust`]
//! relaxes the cooldown of every targeted meal type to zero and exempts those
//! meal types from batch-cook expectations. It never tightens a rule.

pub mod intent;

use std::collections::BTreeSet;

use mealplan_db::models::{MealType, PlanningRules, Recipe};
use serde::Serialize;
use tracing::debug;

use intent::Intent;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adjustment {
    pub rules: PlanningRules,
    /// Explanations for the generator and the user.
    pub notes: Vec<String>,
    pub exempt_meal_types: BTreeSet<MealType>,
    /// A daily phrase was found; mandatory recipes must appear every day.
    pub daily_repetition: bool,
}

/// Relax cooldowns for meal types the user asked to repeat.
pub fn adjust(
    rules: &PlanningRules,
    free_text: &str,
    recipe_pool: &[Recipe],
    mandatory: &[Recipe],
) -> Adjustment {
    let text = free_text.to_lowercase();
    let unchanged = Adjustment {
        rules: rules.clone(),
        notes: Vec::new(),
        exempt_meal_types: BTreeSet::new(),
        daily_repetition: false,
    };
    let Some(rule) = intent::detect(&text) else {
        return unchanged;
    };
    let daily_repetition = rule.intent == Intent::Daily || intent::is_daily(&text);

    let mut targets = intent::keyword_meal_types(&text);
    targets.extend(intent::named_recipe_meal_types(&text, recipe_pool));
    targets.extend(mandatory.iter().flat_map(|r| r.meal_types.iter().copied()));

    let mut notes = Vec::new();
    if targets.is_empty() {
        targets = MealType::ALL.into_iter().collect();
        notes.push(format!(
            "Repetition requested ({}) without a clear meal; cooldowns were relaxed for all meal types.",
            rule.tag
        ));
    }

    let mut adjusted = rules.clone();
    for mt in &targets {
        let before = adjusted.cooldown_for(*mt);
        adjusted.cooldown_days.insert(*mt, 0);
        if before > 0 {
            notes.push(format!(
                "Repetition requested ({}); {mt} cooldown relaxed from {before} days to 0.",
                rule.tag
            ));
        }
    }

    debug!(
        rule = rule.tag,
        daily = daily_repetition,
        exempt = ?targets,
        "relaxed cooldowns for repetition request"
    );

    Adjustment {
        rules: adjusted,
        notes,
        exempt_meal_types: targets,
        daily_repetition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealplan_db::models::Macros;
    use uuid::Uuid;

    fn recipe(name: &str, meal_types: Vec<MealType>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            cuisine: None,
            meal_types,
            servings: 4,
            is_product: false,
            nutrition: Macros::default(),
        }
    }

    #[test]
    fn no_intent_leaves_rules_alone() {
        let rules = PlanningRules::default();
        let adjustment = adjust(&rules, "Something light please", &[], &[]);
        assert_eq!(adjustment.rules, rules);
        assert!(adjustment.notes.is_empty());
        assert!(adjustment.exempt_meal_types.is_empty());
        assert!(!adjustment.daily_repetition);
    }

    #[test]
    fn keyword_targets_one_meal_type() {
        let rules = PlanningRules::default();
        let adjustment = adjust(&rules, "Overnight oats every morning", &[], &[]);
        assert_eq!(adjustment.rules.cooldown_for(MealType::Breakfast), 0);
        assert_eq!(adjustment.rules.cooldown_for(MealType::Dinner), 7);
        assert!(adjustment.daily_repetition);
        assert_eq!(
            adjustment.exempt_meal_types.into_iter().collect::<Vec<_>>(),
            vec![MealType::Breakfast]
        );
        assert_eq!(
            adjustment.notes,
            vec!["Repetition requested (every-meal-time); breakfast cooldown relaxed from 2 days to 0."]
        );
    }

    #[test]
    fn named_recipe_supplies_meal_type() {
        let pool = vec![recipe("Chicken Tacos", vec![MealType::Dinner])];
        let adjustment = adjust(
            &PlanningRules::default(),
            "Chicken tacos on Monday and Thursday",
            &pool,
            &[],
        );
        assert_eq!(adjustment.rules.cooldown_for(MealType::Dinner), 0);
        assert_eq!(adjustment.rules.cooldown_for(MealType::Lunch), 3);
        assert!(!adjustment.daily_repetition);
    }

    #[test]
    fn mandatory_recipe_supplies_meal_type() {
        let soup = recipe("Chicken Soup", vec![MealType::Lunch]);
        let adjustment = adjust(&PlanningRules::default(), "I want it daily", &[], &[soup]);
        assert_eq!(
            adjustment.exempt_meal_types.into_iter().collect::<Vec<_>>(),
            vec![MealType::Lunch]
        );
        assert!(adjustment.daily_repetition);
    }

    #[test]
    fn unknown_meal_type_relaxes_everything() {
        let adjustment = adjust(&PlanningRules::default(), "Same thing every day", &[], &[]);
        for mt in MealType::ALL {
            assert_eq!(adjustment.rules.cooldown_for(mt), 0);
        }
        assert_eq!(adjustment.exempt_meal_types.len(), 4);
        assert!(adjustment.notes[0].contains("without a clear meal"));
    }

    #[test]
    fn never_tightens() {
        let mut rules = PlanningRules::default();
        rules.cooldown_days.remove(&MealType::Snack);
        let adjustment = adjust(&rules, "snacks every day", &[], &[]);
        assert_eq!(adjustment.rules.cooldown_for(MealType::Snack), 0);
        assert!(adjustment.notes.is_empty());
        for mt in MealType::ALL {
            assert!(adjustment.rules.cooldown_for(mt) <= rules.cooldown_for(mt));
        }
    }
}
