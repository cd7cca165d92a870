//! `mealplan validate`: check a candidate plan offline.
//!
//! Reads the generator's reply from a file and runs the same validator the
//! retry loop uses, without a database or a generator call.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use uuid::Uuid;

use mealplan_core::adjust::adjust;
use mealplan_core::generator::parse_response;
use mealplan_core::service::household_targets;
use mealplan_core::validate::validate;
use mealplan_core::{RecipeCatalog, Schedule, ValidationContext, ValidationResult};
use mealplan_db::models::{PlanningRules, Profile, Recipe, UsageEntry};

use crate::rules_cmd::parse_rules;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Generator reply to check (JSON, fenced JSON, or a CLI result envelope)
    pub candidate: String,
    /// Recipe library as a JSON array
    #[arg(long)]
    pub catalog: String,
    /// Rules TOML (defaults when omitted)
    #[arg(long)]
    pub rules: Option<String>,
    /// Household profiles as a JSON array; enables schedule and macro checks
    #[arg(long)]
    pub profiles: Option<String>,
    /// Recent usage history as a JSON array
    #[arg(long)]
    pub history: Option<String>,
    /// Monday of the planned week (defaults to this week)
    #[arg(long)]
    pub week_start: Option<NaiveDate>,
    /// Free-text wishes used to relax cooldowns
    #[arg(long, default_value = "")]
    pub instructions: String,
    /// Recipe that must appear in the plan (repeatable)
    #[arg(long = "require")]
    pub require: Vec<Uuid>,
}

pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = check(args)?;

    for warning in &result.warnings {
        println!("warning: {warning}");
    }
    for error in &result.errors {
        println!("error: {error}");
    }
    if !result.is_valid {
        bail!("plan is invalid ({} error(s))", result.errors.len());
    }
    println!("Plan is valid ({} warning(s)).", result.warnings.len());
    Ok(())
}

fn check(args: &ValidateArgs) -> Result<ValidationResult> {
    let response = parse_response(&crate::read_file(&args.candidate)?)
        .with_context(|| format!("{} does not contain a plan", args.candidate))?;

    let recipes: Vec<Recipe> = read_json(&args.catalog)?;
    let rules = match &args.rules {
        Some(path) => parse_rules(&crate::read_file(path)?)
            .with_context(|| format!("invalid rules file: {path}"))?,
        None => PlanningRules::default(),
    };
    let profiles: Vec<Profile> = match &args.profiles {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let history: Vec<UsageEntry> = match &args.history {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let mut mandatory = Vec::new();
    for id in &args.require {
        match recipes.iter().find(|r| r.id == *id) {
            Some(recipe) => mandatory.push(recipe.clone()),
            None => bail!("required recipe {id} is not in {}", args.catalog),
        }
    }

    let adjustment = adjust(&rules, &args.instructions, &recipes, &mandatory);
    let context = ValidationContext {
        schedule: Schedule::from_profiles(&profiles),
        exempt_meal_types: adjustment.exempt_meal_types,
        mandatory,
        daily_repetition: adjustment.daily_repetition,
        macro_targets: household_targets(&profiles),
        ..ValidationContext::new(args.week_start.unwrap_or_else(this_monday))
    };

    let mut result = validate(
        &response.meals,
        &adjustment.rules,
        &history,
        &RecipeCatalog::new(recipes),
        &context,
    );
    result.prepend_errors(&response.issues);
    Ok(result)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    serde_json::from_str(&crate::read_file(path)?)
        .with_context(|| format!("failed to parse JSON in {path}"))
}

fn this_monday() -> NaiveDate {
    let today = Local::now().date_naive();
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    const SOUP_ID: &str = "7f9c24e5-2f1b-4d3c-9c7a-0b8d6a1e2f30";
    const SALAD_ID: &str = "0c1d2e3f-4a5b-4c6d-8e7f-9a0b1c2d3e4f";

    fn catalog(dir: &Path) -> String {
        let recipes = format!(
            r#"[
                {{"id": "{SOUP_ID}", "name": "Chicken Soup", "cuisine": "american", "meal_types": ["lunch"], "servings": 4}},
                {{"id": "{SALAD_ID}", "name": "Caesar Salad", "cuisine": "italian", "meal_types": ["lunch"], "servings": 2}}
            ]"#
        );
        write(dir, "recipes.json", &recipes)
    }

    fn args(candidate: String, catalog: String) -> ValidateArgs {
        ValidateArgs {
            candidate,
            catalog,
            rules: None,
            profiles: None,
            history: None,
            week_start: NaiveDate::from_ymd_opt(2026, 10, 19),
            instructions: String::new(),
            require: Vec::new(),
        }
    }

    #[test]
    fn lunch_repeated_inside_cooldown_is_invalid() {
        let tmp = tempfile::TempDir::new().unwrap();
        let candidate = write(
            tmp.path(),
            "plan.json",
            r#"{"meals": [
                {"day": "monday", "meal_type": "lunch", "recipe_name": "Chicken Soup"},
                {"day": "tuesday", "meal_type": "lunch", "recipe_name": "Chicken Soup"}
            ]}"#,
        );
        let rules = write(
            tmp.path(),
            "rules.toml",
            "min_cuisines = 0\nmax_same_cuisine = 0\nbatch_cooking_enabled = true\n\
             max_leftover_days = 3\n\n[cooldown_days]\nlunch = 3\n",
        );
        let mut args = args(candidate, catalog(tmp.path()));
        args.rules = Some(rules);

        let result = check(&args).unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Recipe \"Chicken Soup\" is served for lunch on Tuesday"));
    }

    #[test]
    fn repetition_request_relaxes_cooldown() {
        let tmp = tempfile::TempDir::new().unwrap();
        let candidate = write(
            tmp.path(),
            "plan.json",
            r#"{"meals": [
                {"day": "monday", "meal_type": "lunch", "recipe_name": "Chicken Soup"},
                {"day": "tuesday", "meal_type": "lunch", "recipe_name": "Chicken Soup"}
            ]}"#,
        );
        let rules = write(
            tmp.path(),
            "rules.toml",
            "min_cuisines = 0\nmax_same_cuisine = 0\nbatch_cooking_enabled = true\n\
             max_leftover_days = 3\n\n[cooldown_days]\nlunch = 3\n",
        );
        let mut args = args(candidate, catalog(tmp.path()));
        args.rules = Some(rules);
        args.instructions = "Soup for lunch twice this week".to_owned();

        let result = check(&args).unwrap();
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn structural_issues_are_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let candidate = write(
            tmp.path(),
            "plan.json",
            r#"{"meals": [{"day": "someday", "meal_type": "lunch", "recipe_name": "Chicken Soup"}]}"#,
        );
        let result = check(&args(candidate, catalog(tmp.path()))).unwrap();
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("unknown day"));
    }

    #[test]
    fn unknown_required_recipe_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let candidate = write(tmp.path(), "plan.json", r#"{"meals": []}"#);
        let mut args = args(candidate, catalog(tmp.path()));
        args.require = vec![Uuid::new_v4()];

        let err = check(&args).unwrap_err();
        assert!(err.to_string().contains("is not in"));
    }

    #[test]
    fn unreadable_candidate_names_the_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let candidate = write(tmp.path(), "plan.json", "no plan here");
        let err = check(&args(candidate, catalog(tmp.path()))).unwrap_err();
        assert!(err.to_string().contains("does not contain a plan"));
    }

    #[test]
    fn this_monday_is_a_monday() {
        assert_eq!(this_monday().weekday(), chrono::Weekday::Mon);
    }
}
