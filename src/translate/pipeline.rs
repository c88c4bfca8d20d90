use super::pass::RewritePass;
use super::rules::default_passes;

/// Ordered list of rewrite passes. Each pass runs on the previous one's output.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn RewritePass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with every built-in MySQL → PostgreSQL pass, in order.
    pub fn with_defaults() -> Self {
        Self {
            passes: default_passes(),
        }
    }

    /// Append a pass; it runs after all passes already registered.
    pub fn add_pass(&mut self, pass: Box<dyn RewritePass>) {
        self.passes.push(pass);
    }

    pub fn run(&self, sql: &str) -> String {
        let mut current = sql.to_string();
        for pass in &self.passes {
            current = pass.rewrite(&current);
        }
        current
    }

    /// Like [`run`](Self::run), also returning the passes that changed the text.
    pub fn run_traced(&self, sql: &str) -> (String, Vec<&str>) {
        let mut current = sql.to_string();
        let mut applied = Vec::new();
        for pass in &self.passes {
            let next = pass.rewrite(&current);
            if next != current {
                applied.push(pass.name());
            }
            current = next;
        }
        (current, applied)
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn passes(&self) -> &[Box<dyn RewritePass>] {
        &self.passes
    }
}
