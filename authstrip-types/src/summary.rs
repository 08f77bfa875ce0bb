use crate::outcome::{RewriteOutcome, RewriteStatus, ScanWarning};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Result of one transformer run over a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema: String,
    pub tool: ToolInfo,
    pub run_id: Uuid,
    pub root: String,

    #[serde(default)]
    pub dry_run: bool,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    pub counts: RunCounts,

    /// One entry per scanned file, in scan order.
    #[serde(default)]
    pub outcomes: Vec<RewriteOutcome>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scan_warnings: Vec<ScanWarning>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub scanned: u64,
    /// Files in which a rule matched or an auth reference remains.
    pub matched: u64,
    pub modified: u64,
    pub unchanged: u64,
    pub failed: u64,
    /// Files that still reference auth after the run.
    #[serde(default)]
    pub residual: u64,
}

impl RunSummary {
    pub fn new(tool: ToolInfo, root: impl Into<String>, dry_run: bool) -> Self {
        Self {
            schema: crate::schema::AUTHSTRIP_RUN_V1.to_string(),
            tool,
            run_id: Uuid::new_v4(),
            root: root.into(),
            dry_run,
            started_at: Utc::now(),
            ended_at: None,
            counts: RunCounts::default(),
            outcomes: vec![],
            scan_warnings: vec![],
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &RewriteOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn with_residuals(&self) -> impl Iterator<Item = &RewriteOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !o.residual_references.is_empty())
    }

    pub fn modified(&self) -> impl Iterator<Item = &RewriteOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == RewriteStatus::Modified)
    }
}
