//! `mealplan generate`: run the planning pipeline against the database.

use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDate, Weekday};
use sqlx::PgPool;
use uuid::Uuid;

use mealplan_core::repository::PgPlanRepository;
use mealplan_core::service::{
    GeneratedPlan, PlanOutcome, PlanRequest, ServiceConfig, generate_meal_plan,
};

use crate::config::MealplanConfig;

pub struct GenerateOptions {
    pub household: Uuid,
    pub week_start: NaiveDate,
    pub instructions: String,
    pub require: Vec<Uuid>,
    pub exclude: Vec<Uuid>,
    pub max_attempts: Option<u32>,
    pub json: bool,
}

pub async fn run_generate(
    pool: &PgPool,
    config: &MealplanConfig,
    options: GenerateOptions,
) -> Result<()> {
    if options.week_start.weekday() != Weekday::Mon {
        bail!(
            "--week-start must be a Monday; {} is a {}",
            options.week_start,
            options.week_start.weekday()
        );
    }

    let repo = PgPlanRepository::new(pool.clone());
    let generator = config.generator.generator();
    let mut orchestrator = config.generator.orchestrator();
    if let Some(max) = options.max_attempts {
        orchestrator.max_attempts = max;
    }
    let service_config = ServiceConfig {
        orchestrator,
        ..ServiceConfig::default()
    };

    let request = PlanRequest {
        instructions: options.instructions,
        mandatory_recipe_ids: options.require,
        excluded_recipe_ids: options.exclude,
        ..PlanRequest::new(options.household, options.week_start)
    };

    match generate_meal_plan(&repo, &generator, &request, &service_config).await? {
        PlanOutcome::Generated(plan) => {
            if options.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
            Ok(())
        }
        PlanOutcome::Rejected(reason) => bail!("cannot plan this week: {reason}"),
        PlanOutcome::Exhausted {
            plan_id,
            errors,
            suggestion,
            attempts,
        } => {
            eprintln!("No valid plan after {attempts} attempt(s) (plan {plan_id} marked failed):");
            for error in &errors {
                eprintln!("  - {error}");
            }
            eprintln!();
            eprintln!("{suggestion}");
            bail!("plan generation failed");
        }
    }
}

fn print_plan(plan: &GeneratedPlan) {
    println!("Plan {} ({} attempt(s))", plan.plan_id, plan.attempts);
    let mut current = None;
    for meal in &plan.meals {
        if current != Some(meal.date) {
            current = Some(meal.date);
            println!();
            println!("{} {}", meal.day, meal.date);
        }
        let mut flags = Vec::new();
        if meal.is_leftover {
            flags.push("leftovers");
        }
        if meal.locked {
            flags.push("locked");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!(
            "  {:<10} {} x{}{flags}",
            meal.meal_type.to_string(),
            meal.recipe_name,
            meal.servings
        );
    }

    println!();
    println!("{}", plan.summary);

    if !plan.notes.is_empty() {
        println!();
        println!("Notes:");
        for note in &plan.notes {
            println!("  - {note}");
        }
    }
    if !plan.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &plan.warnings {
            println!("  - {warning}");
        }
    }
}
