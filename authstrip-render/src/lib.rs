//! Rendering helpers (plain text, markdown) for run summaries.

use authstrip_types::outcome::{FailureStage, RewriteOutcome, RewriteStatus};
use authstrip_types::summary::RunSummary;

/// Terminal report: one line per scanned file, then the totals.
pub fn render_summary_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    let verb = if summary.dry_run {
        "Would modify"
    } else {
        "Modified"
    };

    for o in &summary.outcomes {
        match o.status {
            RewriteStatus::Modified => out.push_str(&format!("{verb}: {}\n", o.path)),
            RewriteStatus::Unchanged => {
                out.push_str(&format!("No changes needed: {}\n", o.path))
            }
            RewriteStatus::Failed => {
                out.push_str(&format!("Failed: {}{}\n", o.path, failure_suffix(o)))
            }
        }
        for r in &o.residual_references {
            out.push_str(&format!(
                "  Auth reference remains at line {}: {}\n",
                r.line, r.text
            ));
        }
    }
    for w in &summary.scan_warnings {
        out.push_str(&format!("Skipped: {} ({})\n", w.path, w.message));
    }

    let c = &summary.counts;
    out.push('\n');
    out.push_str(&format!(
        "{verb} {} out of {} files\n",
        c.modified, c.scanned
    ));
    out.push_str(&format!("Files with target patterns: {}\n", c.matched));
    out.push_str(&format!("Unchanged: {}\n", c.unchanged));
    out.push_str(&format!("Failed: {}\n", c.failed));
    if c.residual > 0 {
        out.push_str(&format!(
            "Files with remaining auth references: {}\n",
            c.residual
        ));
    }
    if summary.dry_run {
        out.push_str("Dry run: no files were written.\n");
    }
    out
}

pub fn render_summary_md(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("# authstrip run\n\n");
    out.push_str(&format!("- Root: `{}`\n", summary.root));
    out.push_str(&format!("- Run: `{}`\n", summary.run_id));
    out.push_str(&format!("- Dry run: `{}`\n", summary.dry_run));
    let c = &summary.counts;
    out.push_str(&format!(
        "- Scanned: {} (matched {}, modified {}, unchanged {}, failed {}, residual {})\n\n",
        c.scanned, c.matched, c.modified, c.unchanged, c.failed, c.residual
    ));

    let changed: Vec<&RewriteOutcome> = summary.modified().collect();
    out.push_str("## Modified\n\n");
    if changed.is_empty() {
        out.push_str("_No files modified._\n");
    } else {
        for o in changed {
            let rules = o
                .matched_rules
                .iter()
                .map(|r| format!("`{r}`"))
                .collect::<Vec<_>>()
                .join(", ");
            let marker = if o.marker_inserted {
                " (marker inserted)"
            } else {
                ""
            };
            out.push_str(&format!("- `{}`: {rules}{marker}\n", o.path));
        }
    }

    let failures: Vec<&RewriteOutcome> = summary.failures().collect();
    if !failures.is_empty() {
        out.push_str("\n## Failed\n\n");
        for o in failures {
            out.push_str(&format!("- `{}`{}\n", o.path, failure_suffix(o)));
        }
    }

    let residual: Vec<&RewriteOutcome> = summary.with_residuals().collect();
    if !residual.is_empty() {
        out.push_str("\n## Remaining auth references\n\n");
        for o in residual {
            for r in &o.residual_references {
                out.push_str(&format!(
                    "- `{}:{}` (`{}`): `{}`\n",
                    o.path, r.line, r.pattern, r.text
                ));
            }
        }
    }

    if !summary.scan_warnings.is_empty() {
        out.push_str("\n## Skipped during scan\n\n");
        for w in &summary.scan_warnings {
            out.push_str(&format!("- `{}`: {}\n", w.path, w.message));
        }
    }

    out
}

fn failure_suffix(o: &RewriteOutcome) -> String {
    match &o.failure {
        Some(f) => format!(" ({}): {}", stage_label(f.stage), f.message),
        None => String::new(),
    }
}

fn stage_label(stage: FailureStage) -> &'static str {
    match stage {
        FailureStage::Read => "read",
        FailureStage::Write => "write",
    }
}
