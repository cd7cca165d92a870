//! Configuration file management for mealplan.
//!
//! Provides a TOML-based config file at `~/.config/mealplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mealplan_core::OrchestratorConfig;
use mealplan_core::generator::CommandGenerator;
use mealplan_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub generator: GeneratorSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

/// How the plan generator is run and retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    /// Program receiving the prompt on stdin.
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        let orchestrator = OrchestratorConfig::default();
        Self {
            command: CommandGenerator::DEFAULT_PROGRAM.to_owned(),
            args: CommandGenerator::default_args(),
            timeout_secs: orchestrator.attempt_timeout.as_secs(),
            max_attempts: orchestrator.max_attempts,
            backoff_ms: u64::try_from(orchestrator.backoff.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl GeneratorSection {
    pub fn generator(&self) -> CommandGenerator {
        CommandGenerator::with_command(&self.command, self.args.clone())
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
            attempt_timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mealplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/mealplan` or
/// `~/.config/mealplan`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mealplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mealplan")
}

/// Return the path to the mealplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write a config file, creating parent dirs as needed.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct MealplanConfig {
    pub db_config: DbConfig,
    pub generator: GeneratorSection,
}

impl MealplanConfig {
    /// Resolve configuration from the process environment and the default
    /// config file location.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let path = config_path();
        let file = if path.exists() {
            Some(load_config_from(&path)?)
        } else {
            None
        };
        let env_url = std::env::var(DbConfig::ENV_VAR).ok();
        Ok(Self::resolve_with(cli_db_url, env_url, file))
    }

    /// DB URL: `cli_db_url` > `MEALPLAN_DATABASE_URL` > `[database] url` >
    /// [`DbConfig::DEFAULT_URL`]. Generator settings come from the file or
    /// their defaults.
    pub fn resolve_with(
        cli_db_url: Option<&str>,
        env_url: Option<String>,
        file: Option<ConfigFile>,
    ) -> Self {
        let (file_url, generator) = match file {
            Some(cfg) => (Some(cfg.database.url), cfg.generator),
            None => (None, GeneratorSection::default()),
        };
        let db_url = cli_db_url
            .map(str::to_owned)
            .or(env_url)
            .or(file_url)
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());

        Self {
            db_config: DbConfig::new(db_url),
            generator,
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn file(url: &str) -> ConfigFile {
        ConfigFile {
            database: DatabaseSection {
                url: url.to_owned(),
            },
            generator: GeneratorSection::default(),
        }
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mealplan").join("config.toml");

        let mut original = file("postgresql://testhost:5432/testdb");
        original.generator.command = "/usr/local/bin/llm".to_owned();
        original.generator.max_attempts = 5;
        save_config_to(&path, &original).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), original);
    }

    #[test]
    fn generator_section_is_optional() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[database]\nurl = \"postgresql://h:5432/db\"\n").unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.generator, GeneratorSection::default());
        assert_eq!(loaded.generator.command, "claude");
        assert_eq!(loaded.generator.max_attempts, 3);
    }

    #[test]
    fn partial_generator_section_keeps_other_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[database]\nurl = \"postgresql://h:5432/db\"\n\n[generator]\ntimeout_secs = 30\n",
        )
        .unwrap();

        let generator = load_config_from(&path).unwrap().generator;
        let orchestrator = generator.orchestrator();
        assert_eq!(orchestrator.attempt_timeout, Duration::from_secs(30));
        assert_eq!(orchestrator.backoff, Duration::from_secs(1));
        assert_eq!(generator.args, vec!["-p", "--output-format", "json"]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "not toml at all [").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config file"));
    }

    #[test]
    fn cli_flag_overrides_all() {
        let config = MealplanConfig::resolve_with(
            Some("postgresql://cli:5432/clidb"),
            Some("postgresql://env:5432/envdb".to_owned()),
            Some(file("postgresql://file:5432/filedb")),
        );
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
    }

    #[test]
    fn env_var_overrides_config_file() {
        let config = MealplanConfig::resolve_with(
            None,
            Some("postgresql://env:5432/envdb".to_owned()),
            Some(file("postgresql://file:5432/filedb")),
        );
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
    }

    #[test]
    fn config_file_used_without_flag_or_env() {
        let config =
            MealplanConfig::resolve_with(None, None, Some(file("postgresql://file:5432/filedb")));
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = MealplanConfig::resolve_with(None, None, None);
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.generator, GeneratorSection::default());
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("mealplan/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
