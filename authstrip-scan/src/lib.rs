//! Tree scanner: walks a root directory and yields candidate source files.
//!
//! The walk is lazy and single-use. Excluded directory names prune the whole
//! subtree; only regular files with a configured extension are yielded. Entries
//! come out in file-name order so reports are reproducible. Directories that
//! cannot be listed are reported as [`ScanEntry::Skipped`] and the walk goes on.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory names that are never descended into by default.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".venv",
    "venv",
    ".env",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
];

pub const DEFAULT_EXTENSIONS: &[&str] = &["py"];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root {0} does not exist")]
    RootMissing(Utf8PathBuf),

    #[error("scan root {0} is not a directory")]
    RootNotDirectory(Utf8PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extensions to yield, without the leading dot.
    pub extensions: BTreeSet<String>,
    /// Directory names whose subtrees are skipped.
    pub excluded_dirs: BTreeSet<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanConfig {
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }

    pub fn has_wanted_extension(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.contains(ext))
    }
}

/// One event of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEntry {
    /// A candidate file (absolute or root-joined path).
    File(Utf8PathBuf),
    /// Something that could not be read during traversal; already logged.
    Skipped { path: Utf8PathBuf, message: String },
}

#[derive(Debug, Clone)]
pub struct TreeScanner {
    root: Utf8PathBuf,
    config: ScanConfig,
}

impl TreeScanner {
    /// Validates the root up front; an invalid root is the only fatal scan error.
    pub fn new(root: impl Into<Utf8PathBuf>, config: ScanConfig) -> Result<Self, ScanError> {
        let root = root.into();
        if !root.exists() {
            return Err(ScanError::RootMissing(root));
        }
        if !root.is_dir() {
            return Err(ScanError::RootNotDirectory(root));
        }
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn scan(&self) -> Scan<'_> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Scan {
            walker,
            config: &self.config,
        }
    }
}

/// Lazy iterator over a tree. Not restartable.
pub struct Scan<'a> {
    walker: walkdir::IntoIter,
    config: &'a ScanConfig,
}

impl Iterator for Scan<'_> {
    type Item = ScanEntry;

    fn next(&mut self) -> Option<ScanEntry> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let message = match err.io_error() {
                        Some(io) => io.to_string(),
                        None => err.to_string(),
                    };
                    warn!(path = %path, error = %message, "skipping unreadable entry");
                    return Some(ScanEntry::Skipped {
                        path: Utf8PathBuf::from(path),
                        message,
                    });
                }
            };

            let file_type = entry.file_type();

            if file_type.is_dir() {
                let excluded = entry.depth() > 0
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| self.config.is_excluded_dir(name));
                if excluded {
                    debug!(path = %entry.path().display(), "pruning excluded directory");
                    self.walker.skip_current_dir();
                }
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            let path = match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(p) => p,
                Err(raw) => {
                    let message = "path is not valid UTF-8".to_string();
                    warn!(path = %raw.display(), "skipping non UTF-8 path");
                    return Some(ScanEntry::Skipped {
                        path: Utf8PathBuf::from(raw.to_string_lossy().into_owned()),
                        message,
                    });
                }
            };

            if self.config.has_wanted_extension(&path) {
                return Some(ScanEntry::File(path));
            }
        }
    }
}
