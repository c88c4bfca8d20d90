use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::ConnectionConfig;
use crate::translate::{Dialect, TableAliases};

/// Environment variable naming the database driver. Wins over the file.
pub const DRIVER_ENV: &str = "DB_DRIVER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Driver name the dialect is derived from, e.g. `postgres` or `mysql`.
    pub driver: Option<String>,
    pub statement_timeout_secs: Option<u64>,
    pub database: ConnectionConfig,
    /// Table renames applied after every other rewrite.
    pub table_aliases: TableAliases,
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlbridge")
            .join("config.toml")
    }

    /// Read `path`, or the default location when `None`. A missing default
    /// file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::read(&path)?
                } else {
                    Self::default()
                }
            }
        };
        if let Ok(driver) = std::env::var(DRIVER_ENV) {
            config.driver = Some(driver);
        }
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Dialect named by `driver`; PostgreSQL when unset since that is the
    /// only database this binary connects to.
    pub fn dialect(&self) -> Dialect {
        self.driver
            .as_deref()
            .map(Dialect::from_driver_name)
            .unwrap_or(Dialect::Postgres)
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
