use crate::rule::RuleId;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Terminal state of one scanned file.
///
/// `scanned -> unchanged | modified | failed`; a file never moves twice per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStatus {
    Modified,
    Unchanged,
    Failed,
}

/// Which step of the rewrite failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Content could not be read or decoded; the file was not touched.
    Read,
    /// New content could not be persisted; the original is left in place.
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub stage: FailureStage,
    pub message: String,
}

/// An auth reference still present in a file after its rules ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidualReference {
    /// Id of the detection pattern that flagged the line.
    pub pattern: RuleId,
    /// 1-based line number.
    pub line: usize,
    /// The flagged line, trimmed.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOutcome {
    /// Path relative to the scan root.
    pub path: Utf8PathBuf,
    pub status: RewriteStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_rules: Vec<RuleId>,

    #[serde(default)]
    pub marker_inserted: bool,

    /// References left in the resulting content. Empty for failed files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub residual_references: Vec<ResidualReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,
}

impl RewriteOutcome {
    pub fn unchanged(path: Utf8PathBuf) -> Self {
        Self {
            path,
            status: RewriteStatus::Unchanged,
            matched_rules: vec![],
            marker_inserted: false,
            residual_references: vec![],
            failure: None,
            sha256_before: None,
            sha256_after: None,
        }
    }

    pub fn failed(path: Utf8PathBuf, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            path,
            status: RewriteStatus::Failed,
            matched_rules: vec![],
            marker_inserted: false,
            residual_references: vec![],
            failure: Some(FailureDetail {
                stage,
                message: message.into(),
            }),
            sha256_before: None,
            sha256_after: None,
        }
    }

    /// True when a rule matched or an auth reference remains.
    pub fn has_target_patterns(&self) -> bool {
        !self.matched_rules.is_empty() || !self.residual_references.is_empty()
    }

    pub fn is_failed(&self) -> bool {
        self.status == RewriteStatus::Failed
    }
}

/// An entry the scanner could not read. Not counted as scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: Utf8PathBuf,
    pub message: String,
}
