//! Text for the `explain` and `list-rules` commands.

use authstrip_rules::catalog::{RuleSpec, list_rule_ids, lookup_rule};
use authstrip_rules::{PatternRegistry, Replacement};

const RULE: &str =
    "================================================================================";
const SECTION: &str =
    "--------------------------------------------------------------------------------";

pub fn explain_rule(query: &str) -> anyhow::Result<String> {
    let Some(spec) = lookup_rule(query) else {
        anyhow::bail!(
            "Unknown rule: '{}'\n\nAvailable rules: {}",
            query,
            list_rule_ids().join(", ")
        );
    };
    Ok(render_explanation(spec))
}

fn render_explanation(spec: &RuleSpec) -> String {
    let mut out = String::new();
    out.push_str(&format!("{RULE}\nRULE: {}\n{RULE}\n\n", spec.title));
    out.push_str(&format!("Id:          {}\n", spec.id));
    out.push_str(&format!("Pattern:     {}\n", spec.pattern));
    out.push_str(&format!("Replacement: {}\n\n", spec.replace));
    out.push_str(&format!("DESCRIPTION\n{SECTION}\n{}\n\n", spec.description));
    if spec.replace.contains("{user_id}") {
        out.push_str("{user_id} is the permissive policy's user id (--user-id, [policy] user_id).\n");
    }
    out
}

pub fn rule_list_text(registry: &PatternRegistry) -> String {
    if registry.is_empty() {
        return "No rules active (enforcing policy).\n".to_string();
    }
    let mut out = String::from("Active rules:\n\n");
    out.push_str(&format!("  {:<30} DESCRIPTION\n", "ID"));
    out.push_str(&format!("  {:<30} -----------\n", "--"));
    for rule in registry.rules() {
        out.push_str(&format!("  {:<30} {}\n", rule.id(), rule.description()));
    }
    if !registry.residuals().is_empty() {
        out.push_str("\nDetection only (reported, never rewritten):\n\n");
        for residual in registry.residuals() {
            out.push_str(&format!(
                "  {:<30} {}\n",
                residual.id(),
                residual.description()
            ));
        }
    }
    out.push_str("\nUse 'authstrip explain <id>' for details on builtin rules.\n");
    out
}

pub fn rule_list_json(registry: &PatternRegistry) -> serde_json::Value {
    let rules: Vec<_> = registry
        .rules()
        .iter()
        .map(|r| {
            let replace = match r.replacement() {
                Replacement::Template(t) => Some(t.as_str()),
                Replacement::Function(_) => None,
            };
            serde_json::json!({
                "id": r.id(),
                "pattern": r.pattern().as_str(),
                "replace": replace,
                "description": r.description(),
            })
        })
        .collect();
    serde_json::Value::Array(rules)
}
