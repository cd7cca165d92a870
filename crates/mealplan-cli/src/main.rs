mod config;
mod generate_cmd;
mod rules_cmd;
mod validate_cmd;

use std::io;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

use mealplan_db::config::DbConfig;
use mealplan_db::pool;

use config::MealplanConfig;

#[derive(Parser)]
#[command(name = "mealplan", about = "Constraint-checked weekly meal planning")]
struct Cli {
    /// Database URL (overrides MEALPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Program that receives the planning prompt on stdin
        #[arg(long)]
        generator: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the mealplan database and run migrations
    DbInit,
    /// Generate and store the plan for one household week
    Generate {
        /// Household ID
        #[arg(long)]
        household: Uuid,
        /// Monday of the week to plan (YYYY-MM-DD)
        #[arg(long)]
        week_start: NaiveDate,
        /// Free-text wishes, e.g. "overnight oats every morning"
        #[arg(long, default_value = "")]
        instructions: String,
        /// Recipe that must appear in the plan (repeatable)
        #[arg(long = "require")]
        require: Vec<Uuid>,
        /// Recipe to leave out this week (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<Uuid>,
        /// Override the configured number of generation attempts
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a candidate plan file against the rules (no database required)
    Validate(validate_cmd::ValidateArgs),
    /// Planning rules management
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Print shell completions to stdout
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Print a household's rules as TOML (defaults if none are stored)
    Show {
        #[arg(long)]
        household: Uuid,
    },
    /// Store a household's rules from a TOML file
    Set {
        #[arg(long)]
        household: Uuid,
        /// Path to the rules TOML file
        file: String,
    },
}

/// Execute the `mealplan init` command: write config file.
fn cmd_init(db_url: &str, generator: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_owned(),
        },
        generator: config::GeneratorSection::default(),
    };
    if let Some(program) = generator {
        cfg.generator.command = program;
    }
    config::save_config_to(&path, &cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  generator.command = {}", cfg.generator.command);
    println!();
    println!("Next: run `mealplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `mealplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = MealplanConfig::resolve(cli_db_url)?;

    println!("Initializing mealplan database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("mealplan db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            generator,
            force,
        } => {
            cmd_init(&db_url, generator, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Generate {
            household,
            week_start,
            instructions,
            require,
            exclude,
            max_attempts,
            json,
        } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let options = generate_cmd::GenerateOptions {
                household,
                week_start,
                instructions,
                require,
                exclude,
                max_attempts,
                json,
            };
            let result = generate_cmd::run_generate(&db_pool, &resolved, options).await;
            db_pool.close().await;
            result?;
        }
        Commands::Validate(args) => {
            validate_cmd::run_validate(&args)?;
        }
        Commands::Rules { command } => {
            let resolved = MealplanConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = rules_cmd::run_rules_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_owned();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
        }
    }

    Ok(())
}

/// Read a whole file, naming it in the error.
pub(crate) fn read_file(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_accepts_repeated_requirements() {
        let soup = Uuid::new_v4();
        let stew = Uuid::new_v4();
        let household = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "mealplan".to_owned(),
            "generate".to_owned(),
            "--household".to_owned(),
            household.to_string(),
            "--week-start".to_owned(),
            "2026-10-19".to_owned(),
            "--require".to_owned(),
            soup.to_string(),
            "--require".to_owned(),
            stew.to_string(),
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                household: parsed,
                week_start,
                require,
                max_attempts,
                ..
            } => {
                assert_eq!(parsed, household);
                assert_eq!(week_start, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
                assert_eq!(require, vec![soup, stew]);
                assert_eq!(max_attempts, None);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_rejects_a_bad_date() {
        let result = Cli::try_parse_from([
            "mealplan",
            "generate",
            "--household",
            "7f9c24e5-2f1b-4d3c-9c7a-0b8d6a1e2f30",
            "--week-start",
            "next monday",
        ]);
        assert!(result.is_err());
    }
}
