//! Where the planner's PostgreSQL database lives.

use anyhow::{Result, bail};

/// Connection settings for the planner database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// PostgreSQL connection URL, e.g. `postgresql://localhost:5432/mealplan`.
    pub database_url: String,
}

/// A connection URL split around its database segment.
struct UrlParts<'a> {
    server: &'a str,
    database: &'a str,
    query: Option<&'a str>,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/mealplan";

    /// Environment variable that overrides the configured URL.
    pub const ENV_VAR: &str = "MEALPLAN_DATABASE_URL";

    const MAINTENANCE_DB: &str = "postgres";

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    fn parts(&self) -> Option<UrlParts<'_>> {
        let url = self.database_url.as_str();
        let host_start = url.find("://").map_or(0, |i| i + 3);
        let slash = host_start + url[host_start..].find('/')?;
        let path = &url[slash + 1..];
        let (database, query) = match path.split_once('?') {
            Some((database, query)) => (database, Some(query)),
            None => (path, None),
        };
        Some(UrlParts {
            server: &url[..slash],
            database,
            query,
        })
    }

    /// The database the planner connects to, or `None` when the URL names none.
    pub fn database_name(&self) -> Option<&str> {
        self.parts()
            .map(|p| p.database)
            .filter(|name| !name.is_empty())
    }

    /// The database name, restricted to characters that are safe to splice
    /// into `CREATE DATABASE`.
    pub fn creatable_database_name(&self) -> Result<&str> {
        let Some(name) = self.database_name() else {
            bail!("{} does not name a database", self.database_url);
        };
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            bail!("database name {name:?} may only contain letters, digits and underscores");
        }
        Ok(name)
    }

    /// Same server and query parameters, pointed at the `postgres` database.
    pub fn maintenance_url(&self) -> String {
        match self.parts() {
            Some(UrlParts {
                server,
                query: Some(query),
                ..
            }) => format!("{server}/{}?{query}", Self::MAINTENANCE_DB),
            Some(UrlParts { server, .. }) => format!("{server}/{}", Self::MAINTENANCE_DB),
            None => self.database_url.clone(),
        }
    }
}
