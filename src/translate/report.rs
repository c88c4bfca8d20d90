use serde::Serialize;

use super::dialect::Dialect;
use super::validator::ValidationIssue;

/// What a translation did to one query, for logs and the `report` command.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationReport {
    pub original: String,
    pub translated: String,
    pub dialect: Dialect,
    /// Names of the passes that changed the text, in execution order.
    pub applied_passes: Vec<String>,
    pub placeholders: usize,
    /// Residual MySQL constructs. Always empty for pass-through dialects.
    pub issues: Vec<ValidationIssue>,
    pub ok: bool,
}
