use crate::error::{EditError, EditResult};
use camino::Utf8Path;
use std::io::Write;

/// Reads a source file as UTF-8 text.
pub fn read_source(path: &Utf8Path) -> EditResult<String> {
    let bytes = std::fs::read(path).map_err(|source| EditError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|source| EditError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Replaces `path` with `contents` via a temporary sibling and a rename.
///
/// The original keeps its bytes on any failure; the temporary file is removed
/// when it is dropped without being persisted.
pub fn write_atomic(path: &Utf8Path, contents: &[u8]) -> EditResult<()> {
    let wrap = |source: std::io::Error| EditError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".authstrip-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(wrap)?;
    tmp.write_all(contents).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;

    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(wrap)?;
    }

    tmp.persist(path).map_err(|err| wrap(err.error))?;
    Ok(())
}
