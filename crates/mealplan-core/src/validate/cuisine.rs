use std::collections::{BTreeMap, BTreeSet};

use mealplan_db::models::PlanningRules;

use super::{PlacedMeal, ValidationResult};
use crate::catalog::RecipeCatalog;
use crate::policy::normalize_cuisine;

/// Distinct-cuisine minimum and per-cuisine maximum over freshly cooked,
/// non-product meals. A zero limit disables that side of the check.
pub(super) fn check(
    placed: &[PlacedMeal<'_>],
    rules: &PlanningRules,
    catalog: &RecipeCatalog,
    result: &mut ValidationResult,
) {
    if rules.min_cuisines == 0 && rules.max_same_cuisine == 0 {
        return;
    }

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut counted_meals = 0usize;
    for meal in placed {
        if meal.is_leftover || meal.recipe.is_product {
            continue;
        }
        counted_meals += 1;
        if let Some(cuisine) = meal.recipe.cuisine.as_deref().and_then(normalize_cuisine) {
            *counts.entry(cuisine).or_default() += 1;
        }
    }
    if counted_meals == 0 {
        return;
    }
    if counts.is_empty() {
        result.warn("No planned recipe has a cuisine tag; cuisine variety was not checked");
        return;
    }

    if rules.min_cuisines > 0 {
        let available: BTreeSet<String> = catalog
            .recipes()
            .filter(|r| !r.is_product)
            .filter_map(|r| r.cuisine.as_deref().and_then(normalize_cuisine))
            .collect();
        let available = u32::try_from(available.len()).unwrap_or(u32::MAX);
        let required = rules.min_cuisines.min(available);
        if required < rules.min_cuisines {
            result.warn(format!(
                "The recipe library only has {available} cuisine{}; \
                 the minimum of {} distinct cuisines was lowered to match",
                if available == 1 { "" } else { "s" },
                rules.min_cuisines
            ));
        }
        let distinct = u32::try_from(counts.len()).unwrap_or(u32::MAX);
        if distinct < required {
            let used: Vec<&str> = counts.keys().map(String::as_str).collect();
            result.error(format!(
                "The plan uses only {distinct} distinct cuisine{} ({}); at least {required} are required",
                if distinct == 1 { "" } else { "s" },
                used.join(", ")
            ));
        }
    }

    if rules.max_same_cuisine > 0 {
        for (cuisine, count) in &counts {
            if *count > rules.max_same_cuisine {
                result.error(format!(
                    "Cuisine \"{cuisine}\" is used {count} times; use it at most {} times",
                    rules.max_same_cuisine
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::validate;
    use super::*;
    use mealplan_db::models::{DayOfWeek, MealType};

    fn rules(min: u32, max: u32) -> PlanningRules {
        let mut rules = lax_rules();
        rules.min_cuisines = min;
        rules.max_same_cuisine = max;
        rules
    }

    #[test]
    fn too_few_cuisines() {
        let pasta = recipe("Pasta", "Italian", MealType::Dinner, None);
        let pizza = recipe("Pizza", "italian", MealType::Dinner, None);
        let tacos = recipe("Tacos", "mexican", MealType::Dinner, None);
        let pho = recipe("Pho", "vietnamese", MealType::Dinner, None);
        let catalog = RecipeCatalog::new([pasta.clone(), pizza.clone(), tacos.clone(), pho]);

        let meals = vec![
            meal(DayOfWeek::Monday, MealType::Dinner, &pasta),
            meal(DayOfWeek::Tuesday, MealType::Dinner, &pizza),
            meal(DayOfWeek::Wednesday, MealType::Dinner, &tacos),
        ];
        let result = validate(&meals, &rules(3, 0), &[], &catalog, &context());
        assert_eq!(
            result.errors,
            vec!["The plan uses only 2 distinct cuisines (italian, mexican); at least 3 are required"]
        );
    }

    #[test]
    fn too_many_of_one_cuisine_ignores_leftovers() {
        let pasta = recipe("Pasta", "italian", MealType::Dinner, None);
        let pizza = recipe("Pizza", "italian", MealType::Dinner, None);
        let risotto = recipe("Risotto", "italian", MealType::Dinner, None);
        let catalog = RecipeCatalog::new([pasta.clone(), pizza.clone(), risotto.clone()]);

        let mut meals = vec![
            meal(DayOfWeek::Monday, MealType::Dinner, &pasta),
            meal(DayOfWeek::Tuesday, MealType::Dinner, &pasta).leftover_of(Some(DayOfWeek::Monday)),
            meal(DayOfWeek::Wednesday, MealType::Dinner, &pizza),
        ];
        let result = validate(&meals, &rules(0, 2), &[], &catalog, &context());
        assert!(result.errors.is_empty(), "{:?}", result.errors);

        meals.push(meal(DayOfWeek::Thursday, MealType::Dinner, &risotto));
        let result = validate(&meals, &rules(0, 2), &[], &catalog, &context());
        assert_eq!(
            result.errors,
            vec!["Cuisine \"italian\" is used 3 times; use it at most 2 times"]
        );
    }

    #[test]
    fn minimum_is_capped_by_library() {
        let pasta = recipe("Pasta", "italian", MealType::Dinner, None);
        let catalog = RecipeCatalog::new([pasta.clone()]);
        let meals = vec![meal(DayOfWeek::Monday, MealType::Dinner, &pasta)];
        let result = validate(&meals, &rules(3, 0), &[], &catalog, &context());
        assert!(result.errors.is_empty());
        assert!(result.warnings[0].contains("only has 1 cuisine;"));
    }

    #[test]
    fn untagged_plan_warns() {
        let mut stew = recipe("Stew", "", MealType::Dinner, None);
        stew.cuisine = None;
        let catalog = RecipeCatalog::new([stew.clone()]);
        let meals = vec![meal(DayOfWeek::Monday, MealType::Dinner, &stew)];
        let result = validate(&meals, &rules(3, 3), &[], &catalog, &context());
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }
}
