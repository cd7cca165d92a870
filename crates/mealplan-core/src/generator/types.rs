use chrono::NaiveDate;
use mealplan_db::models::{DayOfWeek, MealSlot, MealType, PlanningRules, Profile, Recipe, UsageEntry};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::plan::LockedMeal;

/// One meal as proposed by the generator. Nothing here is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMeal {
    pub day: DayOfWeek,
    pub meal_type: MealType,
    #[serde(default)]
    pub recipe_id: Option<Uuid>,
    #[serde(default)]
    pub recipe_name: Option<String>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub is_leftover: bool,
    /// Day the leftovers were cooked, when the generator names it.
    #[serde(default)]
    pub leftover_source_day: Option<DayOfWeek>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CandidateMeal {
    /// A freshly cooked meal referencing a recipe by name.
    pub fn new(day: DayOfWeek, meal_type: MealType, recipe_name: impl Into<String>) -> Self {
        Self {
            day,
            meal_type,
            recipe_id: None,
            recipe_name: Some(recipe_name.into()),
            servings: None,
            is_leftover: false,
            leftover_source_day: None,
            notes: None,
        }
    }

    pub fn with_recipe_id(mut self, id: Uuid) -> Self {
        self.recipe_id = Some(id);
        self
    }

    /// Mark as leftovers cooked on `source` (or an unnamed earlier day).
    pub fn leftover_of(mut self, source: Option<DayOfWeek>) -> Self {
        self.is_leftover = true;
        self.leftover_source_day = source;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn slot(&self) -> MealSlot {
        MealSlot::new(self.day, self.meal_type)
    }

    /// How the meal is referred to in messages.
    pub fn label(&self) -> String {
        match (&self.recipe_name, self.recipe_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "an unnamed recipe".to_owned(),
        }
    }
}

/// A parsed generator reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorResponse {
    pub meals: Vec<CandidateMeal>,
    /// The generator's own description of the plan. Its numbers are not
    /// trusted; see [`crate::reconcile::summary`].
    #[serde(default)]
    pub summary: String,
    /// Structural problems found while parsing (unreadable meals, unknown
    /// days). Treated as validation errors.
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Everything a generator needs to propose a plan.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub household_id: Uuid,
    pub week_start: NaiveDate,
    pub profiles: Vec<Profile>,
    /// Candidate recipes after macro filtering.
    pub recipes: Vec<Recipe>,
    pub rules: PlanningRules,
    pub history: Vec<UsageEntry>,
    pub locked_meals: Vec<LockedMeal>,
    pub mandatory_recipes: Vec<Recipe>,
    /// The mandatory recipes should be served every applicable day.
    pub daily_repetition: bool,
    /// User instructions plus planner notes.
    pub instructions: String,
    /// Errors from the previous attempt; empty on the first.
    pub feedback: Vec<String>,
}

impl GenerationRequest {
    pub fn new(household_id: Uuid, week_start: NaiveDate, rules: PlanningRules) -> Self {
        Self {
            household_id,
            week_start,
            profiles: Vec::new(),
            recipes: Vec::new(),
            rules,
            history: Vec::new(),
            locked_meals: Vec::new(),
            mandatory_recipes: Vec::new(),
            daily_repetition: false,
            instructions: String::new(),
            feedback: Vec::new(),
        }
    }
}

/// Failure to obtain a usable reply from the generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to start plan generator `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("plan generator I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("plan generator exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    /// The reply contained no readable plan. Unlike transport failures this
    /// is reported back to the generator.
    #[error("plan generator returned no usable plan: {0}")]
    Malformed(String),

    #[error("plan generator reported an error: {0}")]
    Reported(String),
}
