//! Builtin rule catalog for the permissive policy.
//!
//! Patterns target distinct call sites, so results do not depend on the order in
//! which rules run. Every replacement is chosen so it cannot match any pattern
//! here: dependency rules drop the guarded function name, and access-check rules
//! either drop the `await` or turn the statement into `pass` plus a comment.
//!
//! Access-check rules match the call's own argument list (one level of nested
//! parentheses) and only when nothing but whitespace or a comment follows it.
//! Anything else on the line stays untouched and is reported as a residual
//! reference instead.

use crate::error::RuleError;
use crate::policy::validate_user_id;
use crate::residual::ResidualPattern;
use crate::rule::PatternRule;

/// Placeholder substituted with the configured user id.
const USER_ID: &str = "{user_id}";

/// Static description of a builtin rule.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub pattern: &'static str,
    /// `regex` template; `{user_id}` is replaced before compilation.
    pub replace: &'static str,
    pub description: &'static str,
}

pub static BUILTIN_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "jwt-user-dependency",
        title: "JWT user dependency",
        pattern: r"\bDepends\(\s*get_current_user_id_from_jwt\s*\)",
        replace: r#"Depends(lambda: "{user_id}")"#,
        description: "Route parameters resolved from a verified JWT resolve to the fixed local user instead.",
    },
    RuleSpec {
        id: "optional-jwt-user-dependency",
        title: "Optional JWT user dependency",
        pattern: r"\bDepends\(\s*get_optional_user_id_from_jwt\s*\)",
        replace: r#"Depends(lambda: "{user_id}")"#,
        description: "Optional-auth parameters always resolve to the fixed local user.",
    },
    RuleSpec {
        id: "stream-auth-dependency",
        title: "Streaming auth dependency",
        pattern: r"\bDepends\(\s*get_user_id_from_stream_auth\s*\)",
        replace: r#"Depends(lambda: "{user_id}")"#,
        description: "Streaming endpoints stop reading tokens from the query string.",
    },
    RuleSpec {
        id: "admin-api-key-dependency",
        title: "Admin API key dependency",
        pattern: r"\bDepends\(\s*verify_admin_api_key\s*\)",
        replace: "Depends(lambda: True)",
        description: "Admin endpoints no longer require the X-Admin-Api-Key header.",
    },
    RuleSpec {
        id: "thread-access-check",
        title: "Thread access check",
        pattern: r"(?mR)^([ \t]*)await[ \t]+verify_thread_access\(([^()\r\n]*(?:\([^()\r\n]*\)[^()\r\n]*)*)\)([ \t]*(?:#[^\r\n]*)?)$",
        replace: "${1}pass  # No-auth: verify_thread_access(${2})${3}",
        description: "Standalone `await verify_thread_access(...)` statements become `pass`, keeping the call as a comment.",
    },
    RuleSpec {
        id: "thread-access-result",
        title: "Thread access result",
        pattern: r"(?mR)(=[ \t]*)await[ \t]+verify_thread_access\([^()\r\n]*(?:\([^()\r\n]*\)[^()\r\n]*)*\)([ \t]*(?:#[^\r\n]*)?)$",
        replace: "${1}True${2}",
        description: "Assignments from `await verify_thread_access(...)` receive `True`.",
    },
    RuleSpec {
        id: "agent-access-check",
        title: "Agent access check",
        pattern: r"(?mR)^([ \t]*)await[ \t]+verify_agent_access\(([^()\r\n]*(?:\([^()\r\n]*\)[^()\r\n]*)*)\)([ \t]*(?:#[^\r\n]*)?)$",
        replace: "${1}pass  # No-auth: verify_agent_access(${2})${3}",
        description: "Standalone `await verify_agent_access(...)` statements become `pass`, keeping the call as a comment.",
    },
    RuleSpec {
        id: "agent-access-result",
        title: "Agent access result",
        pattern: r"(?mR)(=[ \t]*)await[ \t]+verify_agent_access\([^()\r\n]*(?:\([^()\r\n]*\)[^()\r\n]*)*\)([ \t]*(?:#[^\r\n]*)?)$",
        replace: "${1}True${2}",
        description: "Assignments from `await verify_agent_access(...)` receive `True`.",
    },
];

/// Detection-only pattern: flags auth references that no rule rewrites.
#[derive(Debug, Clone)]
pub struct ResidualSpec {
    pub id: &'static str,
    pub pattern: &'static str,
    pub description: &'static str,
}

pub static RESIDUAL_PATTERNS: &[ResidualSpec] = &[
    ResidualSpec {
        id: "auth-helper-call",
        pattern: r"\b(?:verify_thread_access|verify_agent_access|get_current_user_id_from_jwt|get_optional_user_id_from_jwt|get_user_id_from_stream_auth|verify_admin_api_key)[ \t]*\(",
        description: "A call to an auth helper that no rule rewrote, e.g. `return await verify_thread_access(...)` or a call split over several lines.",
    },
    ResidualSpec {
        id: "auth-dependency",
        pattern: r"\b(?:Depends|Security)\([ \t]*(?:get_current_user_id_from_jwt|get_optional_user_id_from_jwt|get_user_id_from_stream_auth|verify_admin_api_key)\b",
        description: "An auth dependency in a form the dependency rules do not rewrite, e.g. with extra arguments.",
    },
];

/// Compiles the catalog for `user_id`.
pub fn permissive_rules(user_id: &str) -> Result<Vec<PatternRule>, RuleError> {
    validate_user_id(user_id)?;
    // `$` is the expansion sigil in templates.
    let escaped = user_id.replace('$', "$$");

    BUILTIN_RULES
        .iter()
        .map(|spec| {
            let template = spec.replace.replace(USER_ID, &escaped);
            PatternRule::template(spec.id, spec.pattern, template)
                .map(|r| r.with_description(spec.description))
        })
        .collect()
}

pub fn residual_patterns() -> Result<Vec<ResidualPattern>, RuleError> {
    RESIDUAL_PATTERNS
        .iter()
        .map(|spec| {
            ResidualPattern::new(spec.id, spec.pattern).map(|p| p.with_description(spec.description))
        })
        .collect()
}

/// Finds a builtin rule by id, case-insensitively, accepting `_` for `-`.
pub fn lookup_rule(query: &str) -> Option<&'static RuleSpec> {
    let normalized = query.to_lowercase().replace('_', "-");
    BUILTIN_RULES.iter().find(|r| r.id == normalized)
}

pub fn list_rule_ids() -> Vec<&'static str> {
    BUILTIN_RULES.iter().map(|r| r.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"from fastapi import APIRouter, Depends
from utils.auth_utils import get_current_user_id_from_jwt, verify_thread_access

router = APIRouter()

@router.get("/threads/{thread_id}")
async def get_thread(thread_id: str, user_id: str = Depends(get_current_user_id_from_jwt)):
    await verify_thread_access(client, thread_id, user_id)
    return {"ok": True}

@router.get("/me")
async def me(user_id: Optional[str] = Depends(get_optional_user_id_from_jwt)):
    allowed = await verify_agent_access(client, agent_id, user_id)
    return allowed

@router.post("/admin", dependencies=[Depends(verify_admin_api_key)])
async def admin():
    ok = await verify_thread_access(client, str(tid), user_id)
    await verify_agent_access(client, agent_id, user_id)
    return ok

@router.get("/stream")
async def stream(user_id: str = Depends(get_user_id_from_stream_auth)):
    pass
"#;

    fn apply_all(rules: &[PatternRule], content: &str) -> String {
        let mut out = content.to_string();
        for r in rules {
            out = r.apply(&out).into_owned();
        }
        out
    }

    #[test]
    fn catalog_ids_are_unique_and_kebab_case() {
        let mut ids = list_rule_ids();
        let n = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), n);
        for id in ids {
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c == '-'), "{id}");
        }
    }

    #[test]
    fn every_rule_fires_on_sample() {
        for rule in permissive_rules("local-user").unwrap() {
            assert!(rule.is_match(SAMPLE), "rule {} did not match", rule.id());
        }
    }

    #[test]
    fn replacements_never_rematch() {
        let rules = permissive_rules("local-user").unwrap();
        let once = apply_all(&rules, SAMPLE);
        for rule in &rules {
            assert!(!rule.is_match(&once), "rule {} matches its own output", rule.id());
        }
        assert_eq!(apply_all(&rules, &once), once);
    }

    #[test]
    fn order_does_not_change_result() {
        let rules = permissive_rules("local-user").unwrap();
        let forward = apply_all(&rules, SAMPLE);
        let mut reversed = rules.clone();
        reversed.reverse();
        assert_eq!(apply_all(&reversed, SAMPLE), forward);
    }

    #[test]
    fn rewritten_sample_reads_as_expected() {
        let out = apply_all(&permissive_rules("dev").unwrap(), SAMPLE);

        assert!(out.contains(r#"user_id: str = Depends(lambda: "dev")"#));
        assert!(out.contains(r#"user_id: Optional[str] = Depends(lambda: "dev")"#));
        assert!(out.contains("dependencies=[Depends(lambda: True)]"));
        assert!(out.contains("    pass  # No-auth: verify_thread_access(client, thread_id, user_id)\n"));
        assert!(out.contains("    allowed = True\n"));
        assert!(out.contains("    ok = True\n"));
        assert!(out.contains("    pass  # No-auth: verify_agent_access(client, agent_id, user_id)\n"));
        // Import lines are left alone; only call sites are rewritten.
        assert!(out.contains("from utils.auth_utils import get_current_user_id_from_jwt, verify_thread_access"));
    }

    #[test]
    fn crlf_line_endings_survive() {
        let rules = permissive_rules("local-user").unwrap();
        let src = "async def f():\r\n    await verify_thread_access(c, t, u)\r\n    x = await verify_agent_access(c, a, u)\r\n";
        let out = apply_all(&rules, src);
        assert_eq!(
            out,
            "async def f():\r\n    pass  # No-auth: verify_thread_access(c, t, u)\r\n    x = True\r\n"
        );
    }

    fn apply_reversed(rules: &[PatternRule], content: &str) -> String {
        let mut reversed = rules.to_vec();
        reversed.reverse();
        apply_all(&reversed, content)
    }

    #[test]
    fn keyword_argument_call_is_left_alone() {
        let rules = permissive_rules("local-user").unwrap();
        let src = "    result = process(flag=await verify_thread_access(client, tid, uid))\n";
        assert_eq!(apply_all(&rules, src), src);
    }

    #[test]
    fn and_chained_call_keeps_the_rest_of_the_line() {
        let rules = permissive_rules("local-user").unwrap();
        let src = "    ok = await verify_agent_access(c, a, u) and await check_quota(u)\n";
        assert_eq!(apply_all(&rules, src), src);
    }

    #[test]
    fn semicolon_chained_statement_is_left_alone() {
        let rules = permissive_rules("local-user").unwrap();
        let src = "    await verify_thread_access(c, t, u); audit(u)\n";
        assert_eq!(apply_all(&rules, src), src);
    }

    #[test]
    fn nested_call_rewrites_the_same_in_either_order() {
        let rules = permissive_rules("local-user").unwrap();
        let src = "    await verify_thread_access(c, t, ok=await verify_agent_access(c, a))\n";
        let forward = apply_all(&rules, src);
        assert_eq!(
            forward,
            "    pass  # No-auth: verify_thread_access(c, t, ok=await verify_agent_access(c, a))\n"
        );
        assert_eq!(apply_reversed(&rules, src), forward);
    }

    #[test]
    fn nested_parentheses_in_arguments() {
        let rules = permissive_rules("local-user").unwrap();
        let src = "    allowed = await verify_thread_access(client, str(tid), user_id)\n";
        assert_eq!(apply_all(&rules, src), "    allowed = True\n");
    }

    #[test]
    fn trailing_comment_is_kept() {
        let rules = permissive_rules("local-user").unwrap();
        let src = "    await verify_agent_access(c, a, u)  # owner only\n    x = await verify_thread_access(c, t, u)  # note\n";
        assert_eq!(
            apply_all(&rules, src),
            "    pass  # No-auth: verify_agent_access(c, a, u)  # owner only\n    x = True  # note\n"
        );
    }

    #[test]
    fn dollar_in_user_id_is_literal() {
        let rules = permissive_rules("$1-user").unwrap();
        let out = apply_all(&rules, "Depends(get_current_user_id_from_jwt)");
        assert_eq!(out, r#"Depends(lambda: "$1-user")"#);
    }

    #[test]
    fn residual_patterns_compile() {
        let patterns = residual_patterns().unwrap();
        assert_eq!(patterns.len(), RESIDUAL_PATTERNS.len());
        let call = &patterns[0];
        assert!(call.pattern().is_match("return await verify_thread_access(c, t, u)"));
        assert!(!call.pattern().is_match("from utils.auth_utils import verify_thread_access"));
    }

    #[test]
    fn lookup_accepts_underscores_and_case() {
        assert_eq!(lookup_rule("JWT_USER_DEPENDENCY").unwrap().id, "jwt-user-dependency");
        assert!(lookup_rule("nope").is_none());
    }
}
