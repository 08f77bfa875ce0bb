//! Port traits abstracting file I/O away from the pipeline.

use camino::Utf8Path;

/// Reads source files and persists rewritten content.
pub trait SourceStore {
    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String>;

    /// Must leave the original byte-identical when it fails.
    fn write_atomic(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
}
