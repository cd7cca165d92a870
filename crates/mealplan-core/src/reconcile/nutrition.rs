//! Weekly nutrition rollup over freshly cooked meals.

use mealplan_db::models::MacroTotals;
use serde::{Deserialize, Serialize};

use super::ReconciledMeal;
use crate::catalog::RecipeCatalog;

/// Days the daily average is spread over.
const DAYS_PER_WEEK: f64 = 7.0;

/// Per-serving nutrition summed over non-leftover meals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionRollup {
    pub total: MacroTotals,
    pub daily_average: MacroTotals,
    /// Share of counted meals with calorie data, 0-100.
    pub coverage_pct: f64,
    pub meals_counted: usize,
    pub meals_with_nutrition: usize,
}

impl NutritionRollup {
    pub fn from_meals(meals: &[ReconciledMeal], catalog: &RecipeCatalog) -> Self {
        let mut rollup = Self::default();
        for meal in meals.iter().filter(|m| !m.is_leftover) {
            rollup.meals_counted += 1;
            let Some(recipe) = meal.recipe_id.and_then(|id| catalog.get(id)) else {
                continue;
            };
            if recipe.has_nutrition() {
                rollup.meals_with_nutrition += 1;
                rollup.total.add(&recipe.nutrition);
            }
        }
        rollup.daily_average = rollup.total.divided_by(DAYS_PER_WEEK);
        if rollup.meals_counted > 0 {
            rollup.coverage_pct =
                rollup.meals_with_nutrition as f64 * 100.0 / rollup.meals_counted as f64;
        }
        rollup
    }

    /// The rollup as stored alongside the plan.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mealplan_db::models::{DayOfWeek, Macros, MealType, Recipe};
    use uuid::Uuid;

    fn meal(recipe: &Recipe, day: DayOfWeek, is_leftover: bool) -> ReconciledMeal {
        ReconciledMeal {
            id: Uuid::new_v4(),
            day,
            date: day.date_in_week(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()),
            meal_type: MealType::Dinner,
            recipe_id: Some(recipe.id),
            recipe_name: recipe.name.clone(),
            servings: 2,
            scaling_factor: Some(0.5),
            is_leftover,
            leftover_from_meal_id: None,
            batch_cook_source_day: None,
            notes: None,
            locked: false,
        }
    }

    fn recipe(kcal: Option<f64>, protein: Option<f64>) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: "R".to_owned(),
            cuisine: None,
            meal_types: Vec::new(),
            servings: 4,
            is_product: false,
            nutrition: Macros {
                calories: kcal,
                protein_g: protein,
                ..Macros::default()
            },
        }
    }

    #[test]
    fn leftovers_are_not_double_counted() {
        let chili = recipe(Some(700.0), Some(35.0));
        let bare = recipe(None, None);
        let catalog = RecipeCatalog::new([chili.clone(), bare.clone()]);
        let meals = vec![
            meal(&chili, DayOfWeek::Monday, false),
            meal(&chili, DayOfWeek::Tuesday, true),
            meal(&bare, DayOfWeek::Wednesday, false),
        ];

        let rollup = NutritionRollup::from_meals(&meals, &catalog);
        assert_eq!(rollup.meals_counted, 2);
        assert_eq!(rollup.meals_with_nutrition, 1);
        assert_eq!(rollup.total.calories, 700.0);
        assert_eq!(rollup.daily_average.calories, 100.0);
        assert_eq!(rollup.daily_average.protein_g, 5.0);
        assert_eq!(rollup.coverage_pct, 50.0);
    }

    #[test]
    fn rollup_is_idempotent() {
        let chili = recipe(Some(700.0), None);
        let catalog = RecipeCatalog::new([chili.clone()]);
        let meals = vec![meal(&chili, DayOfWeek::Monday, false)];
        assert_eq!(
            NutritionRollup::from_meals(&meals, &catalog),
            NutritionRollup::from_meals(&meals, &catalog)
        );
    }

    #[test]
    fn empty_plan_has_zero_coverage() {
        let rollup = NutritionRollup::from_meals(&[], &RecipeCatalog::default());
        assert_eq!(rollup.coverage_pct, 0.0);
        assert_eq!(rollup.to_json()["meals_counted"], 0);
    }
}
