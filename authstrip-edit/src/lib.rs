//! Rewrite engine for authstrip.
//!
//! Responsibilities:
//! - Apply matched pattern rules to file content, in registry order.
//! - Insert the bypass-import marker once per rewritten file.
//! - Persist new content atomically (temp sibling + rename).
//! - Render a unified diff of what changed.
//! - Merge `KEY=VALUE` updates into env files.

mod atomic;
mod envfile;
mod error;
mod imports;
mod patch;

pub use atomic::{read_source, write_atomic};
pub use envfile::{EnvMerge, merge_env, update_env_file};
pub use error::{EditError, EditResult};
pub use imports::{insert_after_last_import, last_import_end};
pub use patch::render_patch;

use authstrip_rules::{PatternRegistry, ScanResult};
use authstrip_types::rule::RuleId;
use camino::Utf8PathBuf;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use tracing::debug;

/// Result of rewriting one file in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    /// Rules whose replacement actually changed the content.
    pub applied: Vec<RuleId>,
    pub marker_inserted: bool,
}

/// A [`Rewrite`] tied to the file it came from.
#[derive(Debug, Clone)]
pub struct RewrittenFile {
    pub path: Utf8PathBuf,
    pub before: String,
    pub rewrite: Rewrite,
}

impl RewrittenFile {
    pub fn changed(&self) -> bool {
        self.before != self.rewrite.content
    }
}

/// Applies `matched` rules from `registry` to `content`.
///
/// Rules not listed in `matched` are skipped. The marker is inserted only when
/// the content changed and the marker is not already present.
pub fn rewrite_content(content: &str, matched: &[RuleId], registry: &PatternRegistry) -> Rewrite {
    let mut current = content.to_string();
    let mut applied = Vec::new();

    for rule in registry.rules() {
        if !matched.contains(rule.id()) {
            continue;
        }
        let replaced = match rule.apply(&current) {
            Cow::Borrowed(_) => None,
            Cow::Owned(next) => Some(next),
        };
        if let Some(next) = replaced
            && next != current
        {
            applied.push(rule.id().clone());
            current = next;
        }
    }

    let mut marker_inserted = false;
    let marker = registry.marker();
    if current != content && !marker.is_present(&current) {
        match insert_after_last_import(&current, &marker.lines) {
            Some(with_marker) => {
                current = with_marker;
                marker_inserted = true;
            }
            None => debug!("no top-level import; bypass marker not inserted"),
        }
    }

    Rewrite {
        content: current,
        applied,
        marker_inserted,
    }
}

/// Consumes a detector result and rewrites its content.
pub fn rewrite(scan: ScanResult, registry: &PatternRegistry) -> RewrittenFile {
    let rewrite = rewrite_content(&scan.content_before, &scan.matched_rule_ids, registry);
    RewrittenFile {
        path: scan.path,
        before: scan.content_before,
        rewrite,
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
