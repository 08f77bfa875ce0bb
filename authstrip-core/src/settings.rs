//! Clap-free settings for the rewrite pipeline.

use authstrip_scan::ScanConfig;
use camino::Utf8PathBuf;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub root: Utf8PathBuf,
    pub scan: ScanConfig,

    /// Report what would change without writing anything.
    pub dry_run: bool,
    /// Render a unified diff of every changed file.
    pub collect_patch: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            scan: ScanConfig::default(),
            dry_run: false,
            collect_patch: false,
        }
    }
}
