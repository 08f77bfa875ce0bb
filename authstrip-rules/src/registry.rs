use crate::error::RuleError;
use crate::policy::AccessPolicy;
use crate::residual::ResidualPattern;
use crate::rule::PatternRule;
use authstrip_types::rule::RuleId;
use regex::RegexSet;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Declaration injected once into every rewritten file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportMarker {
    /// Substring whose presence means the marker is already in the file.
    pub detect: String,
    /// Lines inserted after the last top-level import.
    pub lines: Vec<String>,
}

impl Default for ImportMarker {
    fn default() -> Self {
        Self {
            detect: "from utils.no_auth import".to_string(),
            lines: vec![
                "# No-auth mode imports".to_string(),
                "from utils.no_auth import get_default_user_id".to_string(),
            ],
        }
    }
}

impl ImportMarker {
    pub fn is_present(&self, content: &str) -> bool {
        content.contains(&self.detect)
    }
}

/// Ordered, validated set of rules plus the marker they imply.
///
/// Registry order is application order. Ids are unique. Residual patterns only
/// detect; they never rewrite.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
    set: RegexSet,
    marker: ImportMarker,
    residuals: Vec<ResidualPattern>,
}

impl PatternRegistry {
    pub fn new(rules: Vec<PatternRule>, marker: ImportMarker) -> Result<Self, RuleError> {
        if marker.detect.trim().is_empty() {
            return Err(RuleError::EmptyMarker);
        }

        let mut seen = BTreeSet::new();
        for rule in &rules {
            if !seen.insert(rule.id().as_str()) {
                return Err(RuleError::DuplicateId(rule.id().to_string()));
            }
        }

        let set = RegexSet::new(rules.iter().map(|r| r.pattern().as_str()))
            .map_err(RuleError::PatternSet)?;

        debug!(rules = rules.len(), marker = %marker.detect, "pattern registry built");
        Ok(Self {
            rules,
            set,
            marker,
            residuals: vec![],
        })
    }

    /// Registry with no rules: every file is reported unchanged.
    pub fn empty() -> Self {
        Self {
            rules: vec![],
            set: RegexSet::empty(),
            marker: ImportMarker::default(),
            residuals: vec![],
        }
    }

    pub fn for_policy(policy: &AccessPolicy) -> Result<Self, RuleError> {
        match policy {
            AccessPolicy::Enforcing => Ok(Self::empty()),
            AccessPolicy::Permissive { user_id } => Ok(Self::new(
                crate::catalog::permissive_rules(user_id)?,
                ImportMarker::default(),
            )?
            .with_residuals(crate::catalog::residual_patterns()?)),
        }
    }

    /// Appends rules after the existing ones, re-validating the whole registry.
    pub fn extend(self, extra: Vec<PatternRule>) -> Result<Self, RuleError> {
        let mut rules = self.rules;
        rules.extend(extra);
        Ok(Self::new(rules, self.marker)?.with_residuals(self.residuals))
    }

    pub fn with_marker(self, marker: ImportMarker) -> Result<Self, RuleError> {
        Ok(Self::new(self.rules, marker)?.with_residuals(self.residuals))
    }

    pub fn with_residuals(mut self, residuals: Vec<ResidualPattern>) -> Self {
        self.residuals = residuals;
        self
    }

    pub fn residuals(&self) -> &[ResidualPattern] {
        &self.residuals
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn get(&self, id: &RuleId) -> Option<&PatternRule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &RuleId> {
        self.rules.iter().map(|r| r.id())
    }

    pub fn marker(&self) -> &ImportMarker {
        &self.marker
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn pattern_set(&self) -> &RegexSet {
        &self.set
    }
}
