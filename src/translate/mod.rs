//! MySQL → PostgreSQL translation of hand-written raw SQL.
//!
//! ```text
//! raw MySQL text
//!       ↓
//! Dialect detection        (dialect.rs)   pass-through unless PostgreSQL
//!       ↓
//! Rewrite pipeline         (pipeline.rs, rules.rs, aliases.rs)
//!       ↓
//! Placeholder renumbering  (placeholder.rs)   ? → $1, $2, ...
//!       ↓
//! PostgreSQL text
//! ```
//!
//! All rewriting is lexical. Keywords inside string literals or comments
//! are rewritten like any other text, and translating already-translated
//! SQL again is not safe. Translate each raw query exactly once.
pub mod aliases;
mod call;
pub mod dialect;
pub mod pass;
pub mod pipeline;
pub mod placeholder;
pub mod report;
pub mod rules;
pub mod validator;

pub use aliases::{TableAliasPass, TableAliases};
pub use dialect::{detect, Dialect, DriverInfo};
pub use pass::{CallRule, PatternRule, RewritePass};
pub use pipeline::Pipeline;
pub use placeholder::{count_placeholders, renumber_placeholders};
pub use report::TranslationReport;
pub use validator::{check_postgres_syntax, validate, ValidationIssue};

/// A dialect plus the pipeline to reach it. Immutable once built and safe
/// to share between threads.
pub struct Translator {
    dialect: Dialect,
    pipeline: Pipeline,
}

impl Translator {
    pub fn new(dialect: Dialect, pipeline: Pipeline) -> Self {
        Self { dialect, pipeline }
    }

    /// Built-in passes only.
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self::new(dialect, Pipeline::with_defaults())
    }

    /// Built-in passes followed by the configured table renames.
    pub fn with_aliases(dialect: Dialect, aliases: &TableAliases) -> Result<Self, regex::Error> {
        let mut pipeline = Pipeline::with_defaults();
        if !aliases.is_empty() {
            pipeline.add_pass(Box::new(TableAliasPass::new(aliases)?));
        }
        Ok(Self::new(dialect, pipeline))
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The text that would be sent to the database for `sql`.
    pub fn translate(&self, sql: &str) -> String {
        if !self.dialect.needs_translation() {
            return sql.to_string();
        }
        renumber_placeholders(&self.pipeline.run(sql))
    }

    pub fn report(&self, sql: &str) -> TranslationReport {
        let placeholders = count_placeholders(sql);
        if !self.dialect.needs_translation() {
            return TranslationReport {
                original: sql.to_string(),
                translated: sql.to_string(),
                dialect: self.dialect,
                applied_passes: Vec::new(),
                placeholders,
                issues: Vec::new(),
                ok: true,
            };
        }

        let (rewritten, applied) = self.pipeline.run_traced(sql);
        let translated = renumber_placeholders(&rewritten);
        let issues = validate(&translated);
        TranslationReport {
            original: sql.to_string(),
            ok: issues.is_empty(),
            translated,
            dialect: self.dialect,
            applied_passes: applied.into_iter().map(String::from).collect(),
            placeholders,
            issues,
        }
    }
}
