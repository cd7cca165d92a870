//! `mealplan rules` subcommands.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use mealplan_db::models::PlanningRules;
use mealplan_db::queries::rules as rule_queries;

use crate::RulesCommands;

pub async fn run_rules_command(command: RulesCommands, pool: &PgPool) -> Result<()> {
    match command {
        RulesCommands::Show { household } => cmd_show(pool, household).await,
        RulesCommands::Set { household, file } => cmd_set(pool, household, &file).await,
    }
}

async fn cmd_show(pool: &PgPool, household: Uuid) -> Result<()> {
    let (rules, stored) = match rule_queries::get_rules(pool, household).await? {
        Some(rules) => (rules, true),
        None => (PlanningRules::default(), false),
    };
    if !stored {
        println!("# No rules stored for household {household}; showing defaults.");
    }
    print!("{}", render_rules(&rules)?);
    Ok(())
}

async fn cmd_set(pool: &PgPool, household: Uuid, file: &str) -> Result<()> {
    let content = crate::read_file(file)?;
    let rules = parse_rules(&content).with_context(|| format!("invalid rules file: {file}"))?;
    rule_queries::upsert_rules(pool, household, &rules).await?;
    println!("Rules stored for household {household}.");
    Ok(())
}

pub fn render_rules(rules: &PlanningRules) -> Result<String> {
    toml::to_string_pretty(rules).context("failed to serialize rules")
}

pub fn parse_rules(content: &str) -> Result<PlanningRules> {
    toml::from_str(content).context("failed to parse rules TOML")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_defaults_parse_back() {
        let rules = PlanningRules::default();
        let text = render_rules(&rules).unwrap();
        assert!(text.contains("min_cuisines = 3"));
        assert_eq!(parse_rules(&text).unwrap(), rules);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        assert!(parse_rules("min_cuisines = 2\n").is_err());
    }
}
