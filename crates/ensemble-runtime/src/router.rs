//! Keyword routing: sanitized prompt in, subtasks out.
//!
//! The routing table is data, not code: an ordered list of
//! (case-insensitive pattern, target identity) rules evaluated against
//! the sanitized prompt. New routes are added by extending the table,
//! never by touching dispatch logic.

use regex::{Regex, RegexBuilder};

use ensemble_core::{AgentId, Subtask};

/// Errors raised while building a routing table.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// One routing rule: a pattern and the agent it selects.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pattern: Regex,
    target: AgentId,
}

impl RouteRule {
    pub fn target(&self) -> &AgentId {
        &self.target
    }
}

/// Ordered routing table with a fallback target.
///
/// Every rule whose pattern matches the prompt contributes one subtask
/// carrying the whole prompt (not just the matched fragment). If nothing
/// matches, a single fallback subtask is produced — decomposition never
/// returns zero subtasks.
#[derive(Debug, Clone)]
pub struct Router {
    rules: Vec<RouteRule>,
    fallback: AgentId,
}

/// Built-in keyword table: one category per specialty.
const DEFAULT_ROUTES: &[(&str, &str)] = &[
    (r"\b(ui|frontend|react|component|page|css)\b", "frontend"),
    (r"\b(api|server|backend|endpoint)\b", "backend"),
    (r"\b(db|database|schema|sql|migration)\b", "database"),
    (
        r"\b(deploy|ci|docker|infrastructure|pipeline)\b",
        "devops",
    ),
    (r"\b(docs?|documentation|readme)\b", "docs"),
];

impl Router {
    /// Empty table with the given fallback target.
    pub fn new(fallback: AgentId) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// The built-in specialty table, falling back to `frontend`.
    pub fn default_routes() -> Self {
        let mut router = Self::new(AgentId::new("frontend").expect("static id is valid"));
        for (pattern, target) in DEFAULT_ROUTES {
            router = router
                .with_rule(pattern, AgentId::new(target).expect("static id is valid"))
                .expect("static route patterns are valid");
        }
        router
    }

    /// Append a rule. Patterns are compiled case-insensitively.
    pub fn with_rule(mut self, pattern: &str, target: AgentId) -> Result<Self, RouterError> {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RouterError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        self.rules.push(RouteRule {
            pattern: compiled,
            target,
        });
        Ok(self)
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &AgentId {
        &self.fallback
    }

    /// Decompose a sanitized prompt into subtasks, one per matching rule,
    /// in table order.
    pub fn route(&self, prompt: &str) -> Vec<Subtask> {
        let mut subtasks: Vec<Subtask> = self
            .rules
            .iter()
            .filter(|rule| rule.pattern.is_match(prompt))
            .map(|rule| Subtask::new(rule.target.clone(), prompt))
            .collect();

        if subtasks.is_empty() {
            tracing::debug!(fallback = %self.fallback, "no route matched, using fallback");
            subtasks.push(Subtask::new(self.fallback.clone(), prompt));
        }
        subtasks
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::default_routes()
    }
}
