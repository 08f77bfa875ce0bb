use crate::error::RuleError;
use authstrip_types::rule::RuleId;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

pub type ReplaceFn = Arc<dyn Fn(&Captures<'_>) -> String + Send + Sync>;

/// Replacement side of a rule.
#[derive(Clone)]
pub enum Replacement {
    /// A `regex` expansion template (`$1`, `${name}`; `$$` for a literal dollar).
    Template(String),
    /// Computes the replacement from the captures of each match.
    Function(ReplaceFn),
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Replacement::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// One recognized construct and its permissive substitute.
#[derive(Debug, Clone)]
pub struct PatternRule {
    id: RuleId,
    description: String,
    pattern: Regex,
    replacement: Replacement,
}

impl PatternRule {
    pub fn template(
        id: impl Into<String>,
        pattern: &str,
        template: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Self::build(id.into(), pattern, Replacement::Template(template.into()))
    }

    pub fn function<F>(id: impl Into<String>, pattern: &str, f: F) -> Result<Self, RuleError>
    where
        F: Fn(&Captures<'_>) -> String + Send + Sync + 'static,
    {
        Self::build(id.into(), pattern, Replacement::Function(Arc::new(f)))
    }

    fn build(id: String, pattern: &str, replacement: Replacement) -> Result<Self, RuleError> {
        if id.trim().is_empty() {
            return Err(RuleError::EmptyId);
        }
        let pattern = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            id: id.clone(),
            source,
        })?;
        // A rule that matches nothing would splice its replacement between every byte.
        if pattern.is_match("") {
            return Err(RuleError::EmptyMatch { id });
        }
        Ok(Self {
            id: RuleId(id),
            description: String::new(),
            pattern,
            replacement,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> &RuleId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    pub fn is_match(&self, content: &str) -> bool {
        self.pattern.is_match(content)
    }

    /// Replaces every non-overlapping occurrence. Borrows when nothing matched.
    pub fn apply<'a>(&self, content: &'a str) -> Cow<'a, str> {
        match &self.replacement {
            Replacement::Template(t) => self.pattern.replace_all(content, t.as_str()),
            Replacement::Function(f) => self
                .pattern
                .replace_all(content, |caps: &Captures<'_>| f(caps)),
        }
    }
}
