//! Configuration loaded from environment variables and an optional
//! secrets file.
//!
//! Every key is looked up in the environment first, then in the TOML
//! secrets file (`SECRETS_PATH`, default `config/secrets.toml`), then falls
//! back to its default. Empty values count as unset.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::registry::TablePairConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 8000).
    pub port: u16,

    /// PostgreSQL connection URL. When None, the service runs without a store.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Schema qualifying every configured table.
    pub dataset: Option<String>,

    /// Configured table pairs, in selection order.
    pub tables: Vec<TablePairConfig>,

    /// Timeout for the summary probe and for query execution (default: 30s).
    pub query_timeout: Duration,

    /// CORS allowed origins (default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from the process environment and secrets file.
    pub fn from_env() -> Result<Self> {
        let secrets_path = env::var("SECRETS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/secrets.toml"));
        let secrets = load_secrets(&secrets_path);

        Self::from_sources(|key| env::var(key).ok(), &secrets)
    }

    /// Load configuration from an environment lookup and parsed secrets.
    pub fn from_sources<F>(env: F, secrets: &toml::Table) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Settings { env, secrets };

        let port = settings
            .get("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = settings.get("DATABASE_URL");

        let database_max_connections = settings
            .get("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let query_timeout_secs: u64 = settings
            .get("QUERY_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("QUERY_TIMEOUT_SECS must be a valid u64")?;

        let cors_allowed_origins = settings
            .get("CORS_ALLOWED_ORIGINS")
            .or_else(|| settings.get("FRONTEND_URL"))
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            dataset: settings.get("DATASET"),
            tables: settings.table_pairs(),
            query_timeout: Duration::from_secs(query_timeout_secs),
            cors_allowed_origins,
        })
    }
}

struct Settings<'a, F> {
    env: F,
    secrets: &'a toml::Table,
}

impl<F> Settings<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.env)(key)
            .filter(|v| !v.is_empty())
            .or_else(|| match self.secrets.get(key)? {
                toml::Value::String(s) => Some(s.clone()).filter(|s| !s.is_empty()),
                toml::Value::Integer(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// `DATASET_TABLES` as JSON (environment or secrets) or as a TOML array
    /// of tables, falling back to the single `TABLE`/`SUMMARY` pair.
    fn table_pairs(&self) -> Vec<TablePairConfig> {
        if let Some(json) = (self.env)("DATASET_TABLES").filter(|v| !v.is_empty()) {
            match serde_json::from_str(&json) {
                Ok(pairs) => return pairs,
                Err(e) => warn!(error = %e, "failed to parse DATASET_TABLES"),
            }
        } else if let Some(value) = self.secrets.get("DATASET_TABLES") {
            let parsed: Result<Vec<TablePairConfig>, String> = match value {
                toml::Value::String(json) => serde_json::from_str(json).map_err(|e| e.to_string()),
                other => other.clone().try_into().map_err(|e| e.to_string()),
            };
            match parsed {
                Ok(pairs) => return pairs,
                Err(e) => warn!(error = %e, "failed to parse DATASET_TABLES"),
            }
        }

        match self.get("TABLE") {
            Some(table) => vec![TablePairConfig {
                id: "default".to_string(),
                label: table.clone(),
                primary_table: table,
                summary_table: self.get("SUMMARY"),
            }],
            None => Vec::new(),
        }
    }
}

/// Read the secrets file. A missing or unreadable file yields no secrets.
fn load_secrets(path: &Path) -> toml::Table {
    if !path.exists() {
        return toml::Table::new();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| content.parse::<toml::Table>().map_err(anyhow::Error::from));

    parsed.unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "could not load secrets file");
        toml::Table::new()
    })
}
