use crate::registry::PatternRegistry;
use crate::residual::find_residuals;
use authstrip_types::outcome::ResidualReference;
use authstrip_types::rule::RuleId;
use camino::Utf8PathBuf;

/// A file that tested positive, handed once to the rewriter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub path: Utf8PathBuf,
    /// Matched rule ids in registry order, without duplicates.
    pub matched_rule_ids: Vec<RuleId>,
    pub content_before: String,
}

/// Tests content against a registry. Pure: no I/O, no mutation.
#[derive(Debug, Clone, Copy)]
pub struct Detector<'r> {
    registry: &'r PatternRegistry,
}

impl<'r> Detector<'r> {
    pub fn new(registry: &'r PatternRegistry) -> Self {
        Self { registry }
    }

    /// Ids of every rule whose pattern occurs at least once, in one pass over `content`.
    pub fn detect(&self, content: &str) -> Vec<RuleId> {
        let rules = self.registry.rules();
        self.registry
            .pattern_set()
            .matches(content)
            .into_iter()
            .map(|i| rules[i].id().clone())
            .collect()
    }

    /// Lines of `content` that still reference auth, per the registry's residual patterns.
    pub fn residuals(&self, content: &str) -> Vec<ResidualReference> {
        find_residuals(content, self.registry.residuals())
    }

    /// `None` when nothing matched: the file needs no changes.
    pub fn scan(&self, path: Utf8PathBuf, content: String) -> Option<ScanResult> {
        let matched_rule_ids = self.detect(&content);
        if matched_rule_ids.is_empty() {
            return None;
        }
        Some(ScanResult {
            path,
            matched_rule_ids,
            content_before: content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImportMarker, PatternRule};

    fn registry() -> PatternRegistry {
        PatternRegistry::new(
            vec![
                PatternRule::template("first", "alpha", "A").unwrap(),
                PatternRule::template("second", "beta", "B").unwrap(),
                PatternRule::template("third", "gamma", "G").unwrap(),
            ],
            ImportMarker::default(),
        )
        .unwrap()
    }

    #[test]
    fn detects_in_registry_order() {
        let reg = registry();
        let ids = Detector::new(&reg).detect("gamma beta gamma");
        assert_eq!(ids, vec![RuleId::new("second"), RuleId::new("third")]);
    }

    #[test]
    fn zero_matches_is_none() {
        let reg = registry();
        let d = Detector::new(&reg);
        assert!(d.detect("nothing here").is_empty());
        assert!(d.scan("a.py".into(), "nothing here".to_string()).is_none());
    }

    #[test]
    fn scan_keeps_content() {
        let reg = registry();
        let res = Detector::new(&reg)
            .scan("a.py".into(), "alpha".to_string())
            .unwrap();
        assert_eq!(res.content_before, "alpha");
        assert_eq!(res.matched_rule_ids, vec![RuleId::new("first")]);
    }

    #[test]
    fn residuals_come_from_the_registry() {
        let reg = PatternRegistry::for_policy(&crate::AccessPolicy::permissive()).unwrap();
        let d = Detector::new(&reg);
        let src = "async def f():\n    if not await verify_agent_access(c, a, u):\n        raise E\n";
        assert!(d.detect(src).is_empty());
        let found = d.residuals(src);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 2);
        assert_eq!(found[0].pattern.as_str(), "auth-helper-call");
    }

    #[test]
    fn empty_registry_never_matches() {
        let reg = PatternRegistry::empty();
        assert!(Detector::new(&reg).detect("Depends(get_current_user_id_from_jwt)").is_empty());
    }
}
