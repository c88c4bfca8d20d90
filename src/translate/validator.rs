//! Development-time self-check for translated SQL.
//!
//! Nothing on the execution path calls into this module.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::{Parser, ParserError};
use std::fmt;

/// A MySQL-only construct still present in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Short tag of the construct, e.g. `DATE_FORMAT`.
    pub construct: &'static str,
    pub message: &'static str,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.construct, self.message)
    }
}

struct Check {
    construct: &'static str,
    pattern: Regex,
    message: &'static str,
}

static CHECKS: Lazy<Vec<Check>> = Lazy::new(|| {
    [
        (
            "DATE_FORMAT",
            r"(?i)\bDATE_FORMAT\s*\(",
            "DATE_FORMAT call left untranslated",
        ),
        (
            "TIMESTAMPDIFF",
            r"(?i)\bTIMESTAMPDIFF\s*\(",
            "TIMESTAMPDIFF call left untranslated",
        ),
        ("CONCAT", r"(?i)\bCONCAT\s*\(", "CONCAT call left; prefer ||"),
        ("YEAR", r"(?i)\bYEAR\s*\(", "YEAR() call left untranslated"),
        ("MONTH", r"(?i)\bMONTH\s*\(", "MONTH() call left untranslated"),
        ("DAY", r"(?i)\bDAY\s*\(", "DAY() call left untranslated"),
        ("WEEKDAY", r"(?i)\bWEEKDAY\s*\(", "WEEKDAY() call left untranslated"),
        ("IFNULL", r"(?i)\bIFNULL\s*\(", "IFNULL call left untranslated"),
        (
            "DATE_ADD",
            r"(?i)\bDATE_ADD\s*\(",
            "DATE_ADD call left untranslated",
        ),
        (
            "DATE_SUB",
            r"(?i)\bDATE_SUB\s*\(",
            "DATE_SUB call left untranslated",
        ),
        ("CURDATE", r"(?i)\bCURDATE\s*\(", "CURDATE() left untranslated"),
        (
            "LIMIT",
            r"(?i)\bLIMIT\s+\d+\s*,\s*\d+",
            "MySQL-style LIMIT offset, count left",
        ),
        ("BACKTICK", r"`[^`]+`", "backtick-quoted identifier left"),
    ]
    .into_iter()
    .map(|(construct, pattern, message)| Check {
        construct,
        pattern: Regex::new(pattern)
            .unwrap_or_else(|e| panic!("validator pattern {pattern:?}: {e}")),
        message,
    })
    .collect()
});

/// Report every MySQL-only construct still present in `sql`.
///
/// Returns one issue per construct, in a fixed order. An empty list means
/// nothing recognisable is left.
pub fn validate(sql: &str) -> Vec<ValidationIssue> {
    CHECKS
        .iter()
        .filter(|check| check.pattern.is_match(sql))
        .map(|check| ValidationIssue {
            construct: check.construct,
            message: check.message,
        })
        .collect()
}

/// Parse `sql` with sqlparser's PostgreSQL dialect.
///
/// Catches outright syntax breakage in translated text; it says nothing
/// about whether the query would run against a real schema.
pub fn check_postgres_syntax(sql: &str) -> Result<(), ParserError> {
    Parser::parse_sql(&PostgreSqlDialect {}, sql).map(|_| ())
}
