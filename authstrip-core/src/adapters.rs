//! Default filesystem-backed port implementations.

use crate::ports::SourceStore;
use camino::Utf8Path;

/// Reads UTF-8 files and writes through a temporary sibling plus rename.
#[derive(Debug, Clone, Default)]
pub struct FsSourceStore;

impl SourceStore for FsSourceStore {
    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String> {
        Ok(authstrip_edit::read_source(path)?)
    }

    fn write_atomic(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        Ok(authstrip_edit::write_atomic(path, contents)?)
    }
}
