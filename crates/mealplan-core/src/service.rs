//! End-to-end planning for one household week.
//!
//! Loads everything from a [`PlanRepository`], runs the pipeline described in
//! the crate docs, and stores the accepted plan.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use mealplan_db::models::{Macro, Macros, Profile, Recipe};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adjust::adjust;
use crate::catalog::RecipeCatalog;
use crate::error::PlanningInputError;
use crate::generator::{GenerationRequest, PlanGenerator};
use crate::history::synthesize_usage;
use crate::macro_filter;
use crate::orchestrator::{self, GenerationOutcome, OrchestratorConfig, ValidationInputs};
use crate::reconcile::{NutritionRollup, ReconcileInput, ReconciledMeal, reconcile};
use crate::repository::PlanRepository;
use crate::schedule::Schedule;
use crate::validate::ValidationContext;

/// What the caller asks for.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub household_id: Uuid,
    /// Monday of the planned week.
    pub week_start: NaiveDate,
    /// Free-text wishes, e.g. "overnight oats every morning".
    pub instructions: String,
    pub mandatory_recipe_ids: Vec<Uuid>,
    pub excluded_recipe_ids: Vec<Uuid>,
}

impl PlanRequest {
    pub fn new(household_id: Uuid, week_start: NaiveDate) -> Self {
        Self {
            household_id,
            week_start,
            instructions: String::new(),
            mandatory_recipe_ids: Vec::new(),
            excluded_recipe_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound on recipes offered to the generator.
    pub recipe_sample_limit: i64,
    /// Days of usage history checked against cooldowns.
    pub history_days: i64,
    pub orchestrator: OrchestratorConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            recipe_sample_limit: 150,
            history_days: 28,
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

/// A stored, reconciled plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPlan {
    pub plan_id: Uuid,
    pub meals: Vec<ReconciledMeal>,
    pub summary: String,
    pub nutrition: NutritionRollup,
    /// Validator and reconciler warnings.
    pub warnings: Vec<String>,
    /// Rule adjustments and filter decisions made before generation.
    pub notes: Vec<String>,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    Generated(GeneratedPlan),
    /// The household's data cannot support planning; nothing was generated.
    Rejected(PlanningInputError),
    /// Every attempt failed validation. The plan is marked failed.
    Exhausted {
        plan_id: Uuid,
        errors: Vec<String>,
        suggestion: &'static str,
        attempts: u32,
    },
}

/// Per-person daily targets for the household: each macro is the mean over
/// the profiles that set it. `None` when nobody sets any target.
pub fn household_targets(profiles: &[Profile]) -> Option<Macros> {
    let mean = |m: Macro| {
        let values: Vec<f64> = profiles
            .iter()
            .filter_map(|p| p.daily_targets.get(m))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };
    let targets = Macros {
        calories: mean(Macro::Calories),
        protein_g: mean(Macro::Protein),
        carbs_g: mean(Macro::Carbs),
        fat_g: mean(Macro::Fat),
    };
    (!targets.is_empty()).then_some(targets)
}

/// Generate, validate, reconcile and store a plan.
///
/// Domain failures come back as [`PlanOutcome`] variants; `Err` is reserved
/// for storage problems.
pub async fn generate_meal_plan(
    repo: &dyn PlanRepository,
    generator: &dyn PlanGenerator,
    request: &PlanRequest,
    config: &ServiceConfig,
) -> Result<PlanOutcome> {
    let household_id = request.household_id;
    let week_start = request.week_start;

    let profiles = repo.load_profiles(household_id).await?;
    if profiles.is_empty() {
        return Ok(PlanOutcome::Rejected(PlanningInputError::NoProfiles));
    }
    let schedule = Schedule::from_profiles(&profiles);
    if schedule.is_empty() {
        return Ok(PlanOutcome::Rejected(PlanningInputError::NoMealSlots));
    }

    let excluded: HashSet<Uuid> = request.excluded_recipe_ids.iter().copied().collect();
    let mandatory = repo
        .load_recipes_by_ids(household_id, &request.mandatory_recipe_ids)
        .await?;
    if let Some(missing) = request
        .mandatory_recipe_ids
        .iter()
        .find(|id| !mandatory.iter().any(|r| r.id == **id))
    {
        return Ok(PlanOutcome::Rejected(
            PlanningInputError::UnknownMandatoryRecipe(*missing),
        ));
    }
    let mandatory: Vec<Recipe> = mandatory
        .into_iter()
        .filter(|r| !excluded.contains(&r.id))
        .collect();

    let mut pool: Vec<Recipe> = repo
        .load_recipes(household_id, config.recipe_sample_limit)
        .await?
        .into_iter()
        .filter(|r| !excluded.contains(&r.id))
        .collect();
    for recipe in &mandatory {
        if !pool.iter().any(|r| r.id == recipe.id) {
            pool.push(recipe.clone());
        }
    }
    if pool.is_empty() {
        return Ok(PlanOutcome::Rejected(PlanningInputError::EmptyRecipePool));
    }
    let meal_types = schedule.meal_types();
    if let Some(uncovered) = meal_types
        .iter()
        .find(|mt| !pool.iter().any(|r| r.applies_to(**mt)))
    {
        return Ok(PlanOutcome::Rejected(
            PlanningInputError::NoRecipesForMealType(uncovered.to_string()),
        ));
    }

    let rules = repo.load_rules(household_id).await?.unwrap_or_default();
    let history = repo
        .load_history(
            household_id,
            week_start - Duration::days(config.history_days),
            week_start,
        )
        .await?;

    let plan_id = repo.ensure_plan(household_id, week_start).await?;
    let locked = repo.load_locked_meals(plan_id).await?;

    let adjustment = adjust(&rules, &request.instructions, &pool, &mandatory);
    let mut notes = adjustment.notes.clone();

    let targets = household_targets(&profiles);
    let offered = match &targets {
        Some(targets) => {
            let outcome = macro_filter::filter(
                &pool,
                targets,
                adjustment.rules.macro_mode,
                &adjustment.rules.priorities,
                schedule.has_snacks(),
                &meal_types,
            );
            notes.push(outcome.rationale);
            let mut kept = outcome.kept;
            for recipe in &mandatory {
                if !kept.iter().any(|r| r.id == recipe.id) {
                    kept.push(recipe.clone());
                }
            }
            kept
        }
        None => pool.clone(),
    };

    let mut instructions = request.instructions.trim().to_owned();
    for note in &notes {
        if !instructions.is_empty() {
            instructions.push_str("\n\n");
        }
        instructions.push_str(note);
    }

    let generation = GenerationRequest {
        profiles: profiles.clone(),
        recipes: offered,
        history: history.clone(),
        locked_meals: locked.clone(),
        mandatory_recipes: mandatory.clone(),
        daily_repetition: adjustment.daily_repetition,
        instructions,
        ..GenerationRequest::new(household_id, week_start, adjustment.rules.clone())
    };

    let catalog = RecipeCatalog::new(pool);
    let context = ValidationContext {
        schedule: schedule.clone(),
        locked: locked.clone(),
        exempt_meal_types: adjustment.exempt_meal_types.clone(),
        mandatory,
        daily_repetition: adjustment.daily_repetition,
        macro_targets: targets,
        ..ValidationContext::new(week_start)
    };
    let inputs = ValidationInputs {
        history: &history,
        catalog: &catalog,
        context: &context,
    };

    let outcome =
        orchestrator::generate(generator, &generation, inputs, &config.orchestrator).await;
    let (response, validation, attempts) = match outcome {
        GenerationOutcome::Accepted {
            response,
            validation,
            attempts,
        } => (response, validation, attempts),
        GenerationOutcome::Exhausted {
            errors,
            attempts,
            suggestion,
        } => {
            warn!(%household_id, %plan_id, attempts, errors = errors.len(), "plan generation exhausted");
            repo.mark_failed(plan_id).await?;
            return Ok(PlanOutcome::Exhausted {
                plan_id,
                errors,
                suggestion,
                attempts,
            });
        }
    };

    let reconciled = reconcile(&ReconcileInput {
        meals: &response.meals,
        summary: &response.summary,
        catalog: &catalog,
        schedule: &schedule,
        locked: &locked,
        week_start,
    });

    repo.save_meals(plan_id, &reconciled.meals).await?;
    repo.link_leftovers(&reconciled.leftover_links()).await?;
    let recorded = repo
        .record_usage(household_id, &synthesize_usage(&reconciled.meals))
        .await?;
    repo.save_summary(plan_id, &reconciled.summary, &reconciled.nutrition)
        .await?;

    let mut warnings = validation.warnings;
    warnings.extend(reconciled.warnings);

    info!(
        %household_id,
        %plan_id,
        attempts,
        meals = reconciled.meals.len(),
        usage_recorded = recorded,
        warnings = warnings.len(),
        "meal plan generated"
    );

    Ok(PlanOutcome::Generated(GeneratedPlan {
        plan_id,
        meals: reconciled.meals,
        summary: reconciled.summary,
        nutrition: reconciled.nutrition,
        warnings,
        notes,
        attempts,
    }))
}
