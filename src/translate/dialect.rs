use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL dialect spoken by the database behind a handle.
///
/// Raw queries are always written in MySQL syntax. Only a PostgreSQL
/// target needs them rewritten; every other dialect, including one we do
/// not recognise, receives the text unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    #[default]
    Unknown,
}

impl Dialect {
    /// Map a driver identifier (`postgres`, `pgx`, `mysql`, ...) to a dialect.
    pub fn from_driver_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pgx" | "pg" => Dialect::Postgres,
            "mysql" | "mariadb" => Dialect::MySql,
            _ => Dialect::Unknown,
        }
    }

    /// Whether MySQL-flavored text has to be rewritten before it can run.
    pub fn needs_translation(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Anything that can report which database driver it talks to.
pub trait DriverInfo {
    fn driver_name(&self) -> &str;
}

/// Inspect a live handle and decide which dialect its SQL must be in.
pub fn detect<H: DriverInfo + ?Sized>(handle: &H) -> Dialect {
    Dialect::from_driver_name(handle.driver_name())
}
