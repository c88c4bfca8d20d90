use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::pass::RewritePass;

/// Logical → physical table names, for tables that were renamed by a
/// migration while raw queries still use the old name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableAliases(BTreeMap<String, String>);

impl TableAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.insert(from, to);
        self
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.0.insert(from.into(), to.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Renames whole-word table references. Runs after every structural pass.
pub struct TableAliasPass {
    renames: Vec<(Regex, String)>,
}

impl TableAliasPass {
    pub fn new(aliases: &TableAliases) -> Result<Self, regex::Error> {
        let renames = aliases
            .iter()
            .filter(|(from, to)| !from.is_empty() && from != to)
            .map(|(from, to)| {
                let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(from)))?;
                Ok((pattern, to.to_string()))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { renames })
    }
}

impl RewritePass for TableAliasPass {
    fn name(&self) -> &str {
        "table_aliases"
    }

    fn description(&self) -> &str {
        "Configured table renames, e.g. proposals -> engineer_proposals"
    }

    fn rewrite(&self, sql: &str) -> String {
        // All patterns match against the input so one rename never feeds another.
        let mut hits: Vec<(usize, usize, &str)> = Vec::new();
        for (pattern, to) in &self.renames {
            for m in pattern.find_iter(sql) {
                if hits.iter().all(|(s, e, _)| m.end() <= *s || m.start() >= *e) {
                    hits.push((m.start(), m.end(), to.as_str()));
                }
            }
        }
        if hits.is_empty() {
            return sql.to_string();
        }
        hits.sort_by_key(|(start, _, _)| *start);

        let mut out = String::with_capacity(sql.len() + 16);
        let mut copied = 0;
        for (start, end, to) in hits {
            out.push_str(&sql[copied..start]);
            out.push_str(to);
            copied = end;
        }
        out.push_str(&sql[copied..]);
        out
    }
}
