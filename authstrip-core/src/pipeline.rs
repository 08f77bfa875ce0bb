//! The scan → detect → rewrite → report pipeline.
//!
//! I/O-agnostic: file contents are read and written through [`SourceStore`].
//! Directory traversal uses the scanner directly.

use crate::ports::SourceStore;
use crate::reporter::Reporter;
use crate::settings::RunSettings;
use authstrip_edit::{render_patch, rewrite, sha256_hex};
use authstrip_rules::{Detector, PatternRegistry, ScanResult};
use authstrip_scan::{ScanEntry, ScanError, TreeScanner};
use authstrip_types::outcome::{
    FailureStage, ResidualReference, RewriteOutcome, RewriteStatus, ScanWarning,
};
use authstrip_types::summary::{RunSummary, ToolInfo};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

/// Fatal pipeline errors. Per-file failures are outcomes, not errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    InvalidRoot(#[from] ScanError),
}

/// Outcome of [`run`].
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// Unified diff of every changed file; empty unless patch collection is on.
    pub patch: String,
}

struct Change {
    path: Utf8PathBuf,
    before: String,
    after: String,
}

/// Runs one pass over `settings.root`.
///
/// Every scanned file ends up in exactly one outcome. Only an invalid root is
/// fatal; it is reported before any file is touched.
pub fn run(
    settings: &RunSettings,
    registry: &PatternRegistry,
    store: &dyn SourceStore,
    tool: ToolInfo,
) -> Result<RunOutcome, ToolError> {
    let scanner = TreeScanner::new(settings.root.clone(), settings.scan.clone())?;
    let detector = Detector::new(registry);
    let mut reporter = Reporter::new(tool, settings.root.as_str(), settings.dry_run);
    let mut changes = Vec::new();

    info!(
        root = %settings.root,
        rules = registry.len(),
        dry_run = settings.dry_run,
        "scan started"
    );

    for entry in scanner.scan() {
        match entry {
            ScanEntry::Skipped { path, message } => reporter.warn(ScanWarning {
                path: relative(scanner.root(), &path),
                message,
            }),
            ScanEntry::File(path) => {
                let rel = relative(scanner.root(), &path);
                let (outcome, change) =
                    process_file(&path, rel, &detector, registry, store, settings.dry_run);
                if settings.collect_patch
                    && let Some(change) = change
                {
                    changes.push(change);
                }
                reporter.record(outcome);
            }
        }
    }

    let summary = reporter.finish();
    let patch = if settings.collect_patch {
        render_patch(
            changes
                .iter()
                .map(|c| (c.path.as_path(), c.before.as_str(), c.after.as_str())),
        )
    } else {
        String::new()
    };

    info!(
        scanned = summary.counts.scanned,
        matched = summary.counts.matched,
        modified = summary.counts.modified,
        residual = summary.counts.residual,
        failed = summary.counts.failed,
        "scan finished"
    );

    Ok(RunOutcome { summary, patch })
}

fn process_file(
    abs: &Utf8Path,
    rel: Utf8PathBuf,
    detector: &Detector<'_>,
    registry: &PatternRegistry,
    store: &dyn SourceStore,
    dry_run: bool,
) -> (RewriteOutcome, Option<Change>) {
    let content = match store.read_to_string(abs) {
        Ok(content) => content,
        Err(err) => {
            let message = format!("{err:#}");
            warn!(path = %rel, error = %message, "read failed; file left untouched");
            return (RewriteOutcome::failed(rel, FailureStage::Read, message), None);
        }
    };

    let matched = detector.detect(&content);
    if matched.is_empty() {
        let mut outcome = RewriteOutcome::unchanged(rel);
        outcome.residual_references = residuals(detector, &outcome.path, &content);
        if outcome.residual_references.is_empty() {
            debug!(path = %outcome.path, "no changes needed");
        }
        return (outcome, None);
    }

    let scan = ScanResult {
        path: rel.clone(),
        matched_rule_ids: matched.clone(),
        content_before: content,
    };
    let file = rewrite(scan, registry);
    if !file.changed() {
        debug!(path = %rel, "rules matched but content is identical");
        let mut outcome = RewriteOutcome::unchanged(rel);
        outcome.matched_rules = matched;
        outcome.residual_references = residuals(detector, &outcome.path, &file.before);
        return (outcome, None);
    }

    let sha256_before = sha256_hex(file.before.as_bytes());
    let sha256_after = sha256_hex(file.rewrite.content.as_bytes());

    if !dry_run && let Err(err) = store.write_atomic(abs, file.rewrite.content.as_bytes()) {
        let message = format!("{err:#}");
        warn!(path = %rel, error = %message, "write failed; original kept");
        let mut outcome = RewriteOutcome::failed(rel, FailureStage::Write, message);
        outcome.matched_rules = matched;
        outcome.sha256_before = Some(sha256_before);
        return (outcome, None);
    }

    let applied: Vec<&str> = file.rewrite.applied.iter().map(|r| r.as_str()).collect();
    info!(
        path = %rel,
        rules = ?applied,
        marker = file.rewrite.marker_inserted,
        dry_run,
        "modified"
    );

    let residual_references = residuals(detector, &rel, &file.rewrite.content);
    let outcome = RewriteOutcome {
        path: rel,
        status: RewriteStatus::Modified,
        matched_rules: matched,
        marker_inserted: file.rewrite.marker_inserted,
        residual_references,
        failure: None,
        sha256_before: Some(sha256_before),
        sha256_after: Some(sha256_after),
    };
    let change = Change {
        path: file.path,
        before: file.before,
        after: file.rewrite.content,
    };
    (outcome, Some(change))
}

fn residuals(detector: &Detector<'_>, path: &Utf8Path, content: &str) -> Vec<ResidualReference> {
    let found = detector.residuals(content);
    if let Some(first) = found.first() {
        warn!(
            path = %path,
            count = found.len(),
            line = first.line,
            "auth references remain that no rule rewrites"
        );
    }
    found
}

fn relative(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    path.strip_prefix(root)
        .map(Utf8Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
