//! `KEY=VALUE` merging for dotenv-style files.

use crate::atomic::{read_source, write_atomic};
use crate::error::{EditError, EditResult};
use camino::Utf8Path;
use std::collections::BTreeSet;
use tracing::info;

/// What a merge did to each key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMerge {
    pub contents: String,
    /// Keys whose existing line was replaced, in file order.
    pub updated: Vec<String>,
    /// Keys appended because the file did not define them, in update order.
    pub added: Vec<String>,
}

/// Merges `updates` into `contents`.
///
/// Blank lines and `#` comments are kept. A line whose key (the text before the
/// first `=`, trimmed) is being updated becomes `KEY=value`; every occurrence
/// of that key is replaced. Keys not found are appended in update order. Every
/// output line ends with `\n`.
pub fn merge_env(contents: &str, updates: &[(String, String)]) -> EnvMerge {
    let mut out = String::with_capacity(contents.len());
    let mut seen = BTreeSet::new();
    let mut updated = Vec::new();

    for raw in contents.lines() {
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();

        let replacement = if trimmed.is_empty() || trimmed.starts_with('#') {
            None
        } else {
            trimmed.split_once('=').and_then(|(key, _)| {
                let key = key.trim();
                updates.iter().find(|(k, _)| k == key)
            })
        };

        match replacement {
            Some((key, value)) => {
                out.push_str(&format!("{key}={value}\n"));
                if seen.insert(key.clone()) {
                    updated.push(key.clone());
                }
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    let mut added = Vec::new();
    for (key, value) in updates {
        if seen.contains(key) || added.contains(key) {
            continue;
        }
        out.push_str(&format!("{key}={value}\n"));
        added.push(key.clone());
    }

    EnvMerge {
        contents: out,
        updated,
        added,
    }
}

/// Applies [`merge_env`] to the file at `path`, writing it atomically.
///
/// A missing file is an error unless `create` is set, in which case it is
/// treated as empty.
pub fn update_env_file(
    path: &Utf8Path,
    updates: &[(String, String)],
    create: bool,
) -> EditResult<EnvMerge> {
    let existing = match read_source(path) {
        Ok(text) => text,
        Err(EditError::Read { source, .. })
            if create && source.kind() == std::io::ErrorKind::NotFound =>
        {
            String::new()
        }
        Err(err) => return Err(err),
    };

    let merge = merge_env(&existing, updates);
    if merge.contents != existing {
        write_atomic(path, merge.contents.as_bytes())?;
    }
    info!(
        path = %path,
        updated = merge.updated.len(),
        added = merge.added.len(),
        "env file merged"
    );
    Ok(merge)
}
