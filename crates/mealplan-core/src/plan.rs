//! Meals carried over from an earlier version of the plan.

use mealplan_db::models::{MealSlot, PlannedMeal};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored meal the user pinned; regeneration must not replace it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedMeal {
    pub id: Uuid,
    pub slot: MealSlot,
    pub recipe_id: Option<Uuid>,
    pub recipe_name: String,
    pub servings: u32,
    pub scaling_factor: Option<f64>,
    pub is_leftover: bool,
    pub notes: Option<String>,
}

impl From<PlannedMeal> for LockedMeal {
    fn from(meal: PlannedMeal) -> Self {
        Self {
            id: meal.id,
            slot: MealSlot::new(meal.day, meal.meal_type),
            recipe_id: meal.recipe_id,
            recipe_name: meal.recipe_name,
            servings: u32::try_from(meal.servings).unwrap_or(0),
            scaling_factor: meal.scaling_factor,
            is_leftover: meal.is_leftover,
            notes: meal.notes,
        }
    }
}
