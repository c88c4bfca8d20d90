use regex::Regex;

use super::call::scan_call;

/// A single text rewrite in the translation pipeline.
///
/// Passes are pure: the same input always yields the same output, and a
/// pass that finds nothing to do returns its input unchanged. Every pass
/// replaces all non-overlapping occurrences in one go.
pub trait RewritePass: Send + Sync {
    /// Unique name identifying this pass.
    fn name(&self) -> &str;

    /// Optional description, shown by `sqlbridge rules`.
    fn description(&self) -> &str {
        ""
    }

    fn rewrite(&self, sql: &str) -> String;
}

/// Regex pass with a `$n` replacement template.
pub struct PatternRule {
    name: &'static str,
    description: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl PatternRule {
    pub fn new(
        name: &'static str,
        description: &'static str,
        pattern: Regex,
        replacement: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            pattern,
            replacement,
        }
    }
}

impl RewritePass for PatternRule {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn rewrite(&self, sql: &str) -> String {
        self.pattern
            .replace_all(sql, self.replacement)
            .into_owned()
    }
}

/// Builds the replacement for one call from the function name as written
/// and the already-rewritten arguments. `None` leaves the call untouched.
pub type CallRewrite = fn(&str, &[String]) -> Option<String>;

/// Pass that rewrites whole function calls.
///
/// `callee` must end in `\(` and capture the function name in group 1.
/// Arguments are located by balancing parentheses, so they may contain
/// nested calls and commas. Calls of the same family nested inside an
/// argument are rewritten first.
pub struct CallRule {
    name: &'static str,
    description: &'static str,
    callee: Regex,
    rewrite: CallRewrite,
}

impl CallRule {
    pub fn new(
        name: &'static str,
        description: &'static str,
        callee: Regex,
        rewrite: CallRewrite,
    ) -> Self {
        Self {
            name,
            description,
            callee,
            rewrite,
        }
    }

    fn apply(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 16);
        let mut copied = 0;
        let mut search = 0;

        while let Some(caps) = self.callee.captures_at(sql, search) {
            let Some(whole) = caps.get(0) else { break };
            let function = caps.get(1).map_or("", |m| m.as_str());

            let replaced = scan_call(sql, whole.end() - 1).and_then(|call| {
                let args: Vec<String> = call.args.iter().map(|arg| self.apply(arg)).collect();
                (self.rewrite)(function, &args).map(|text| (text, call.end))
            });

            match replaced {
                Some((text, end)) => {
                    out.push_str(&sql[copied..whole.start()]);
                    out.push_str(&text);
                    copied = end;
                    search = end;
                }
                // Unsupported shape: keep the call, still visit its arguments.
                None => search = whole.end(),
            }
        }

        out.push_str(&sql[copied..]);
        out
    }
}

impl RewritePass for CallRule {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn rewrite(&self, sql: &str) -> String {
        self.apply(sql)
    }
}
