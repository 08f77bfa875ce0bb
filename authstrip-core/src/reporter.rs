//! Accumulates per-file outcomes into a [`RunSummary`].

use authstrip_types::outcome::{RewriteOutcome, RewriteStatus, ScanWarning};
use authstrip_types::summary::{RunSummary, ToolInfo};
use chrono::Utc;

/// Purely additive: one outcome per scanned file, in the order recorded.
#[derive(Debug)]
pub struct Reporter {
    summary: RunSummary,
}

impl Reporter {
    pub fn new(tool: ToolInfo, root: impl Into<String>, dry_run: bool) -> Self {
        Self {
            summary: RunSummary::new(tool, root, dry_run),
        }
    }

    pub fn record(&mut self, outcome: RewriteOutcome) {
        let counts = &mut self.summary.counts;
        counts.scanned += 1;
        if outcome.has_target_patterns() {
            counts.matched += 1;
        }
        if !outcome.residual_references.is_empty() {
            counts.residual += 1;
        }
        match outcome.status {
            RewriteStatus::Modified => counts.modified += 1,
            RewriteStatus::Unchanged => counts.unchanged += 1,
            RewriteStatus::Failed => counts.failed += 1,
        }
        self.summary.outcomes.push(outcome);
    }

    /// Scan warnings are listed but not counted as scanned files.
    pub fn warn(&mut self, warning: ScanWarning) {
        self.summary.scan_warnings.push(warning);
    }

    pub fn finish(mut self) -> RunSummary {
        self.summary.ended_at = Some(Utc::now());
        self.summary
    }
}
