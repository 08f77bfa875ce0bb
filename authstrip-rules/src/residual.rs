//! Detection-only patterns for auth references the rules leave behind.
//!
//! Matching is line-wise over code: comments, import lines and the name in a
//! `def` line are ignored, so `pass  # No-auth: verify_thread_access(...)` and
//! the helper's own definition are never reported. A `def` line's parameters
//! are still checked.

use crate::error::RuleError;
use authstrip_types::outcome::ResidualReference;
use authstrip_types::rule::RuleId;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct ResidualPattern {
    id: RuleId,
    description: String,
    pattern: Regex,
}

impl ResidualPattern {
    pub fn new(id: impl Into<String>, pattern: &str) -> Result<Self, RuleError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RuleError::EmptyId);
        }
        let pattern = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            id: id.clone(),
            source,
        })?;
        if pattern.is_match("") {
            return Err(RuleError::EmptyMatch { id });
        }
        Ok(Self {
            id: RuleId(id),
            description: String::new(),
            pattern,
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
}

/// One reference per flagged line, attributed to the first pattern that hits it.
pub(crate) fn find_residuals(content: &str, patterns: &[ResidualPattern]) -> Vec<ResidualReference> {
    if patterns.is_empty() {
        return vec![];
    }
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let code = code_part(line)?;
            let hit = patterns.iter().find(|p| p.pattern.is_match(code))?;
            Some(ResidualReference {
                pattern: hit.id.clone(),
                line: idx + 1,
                text: line.trim().to_string(),
            })
        })
        .collect()
}

/// The part of `line` worth checking, or `None` for lines never reported.
fn code_part(line: &str) -> Option<&str> {
    let code = line.split('#').next().unwrap_or_default();
    let head = code.trim_start();
    if head.is_empty() || head.starts_with("import ") || head.starts_with("from ") {
        return None;
    }
    if head.starts_with("def ") || head.starts_with("async def ") {
        return head.split_once('(').map(|(_, params)| params);
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn patterns() -> Vec<ResidualPattern> {
        vec![ResidualPattern::new("call", r"\bverify_thread_access[ \t]*\(").unwrap()]
    }

    #[test]
    fn flags_calls_with_line_numbers() {
        let src = "x = 1\n    return await verify_thread_access(c, t, u)\n";
        let found = find_residuals(src, &patterns());
        assert_eq!(
            found,
            vec![ResidualReference {
                pattern: RuleId::new("call"),
                line: 2,
                text: "return await verify_thread_access(c, t, u)".to_string(),
            }]
        );
    }

    #[test]
    fn ignores_comments_imports_and_definitions() {
        let src = "\
from utils.auth_utils import verify_thread_access
import verify_thread_access
    pass  # No-auth: verify_thread_access(c, t, u)
# verify_thread_access(c)
async def verify_thread_access(client, thread_id, user_id):
def verify_thread_access(client):
";
        assert!(find_residuals(src, &patterns()).is_empty());
    }

    #[test]
    fn checks_parameters_of_def_lines() {
        let dep = vec![ResidualPattern::new("dep", r"\bDepends\([ \t]*verify_admin_api_key\b").unwrap()];
        let src = "async def admin(key = Depends(verify_admin_api_key, use_cache=False)):\n";
        let found = find_residuals(src, &dep);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 1);
    }

    #[test]
    fn no_patterns_finds_nothing() {
        assert!(find_residuals("verify_thread_access(c)", &[]).is_empty());
    }

    #[test]
    fn rejects_empty_matching_pattern() {
        assert!(matches!(
            ResidualPattern::new("any", ".*"),
            Err(RuleError::EmptyMatch { .. })
        ));
    }
}
