//! Error types for authstrip-edit.
//!
//! Read and write failures are kept apart because they leave the file in
//! different states: a read failure never touches it, a write failure leaves the
//! original in place (the temporary file is discarded).

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    /// The file could not be read.
    #[error("read {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not valid UTF-8 text.
    #[error("decode {path} as UTF-8")]
    Decode {
        path: Utf8PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// New content could not be persisted.
    #[error("write {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EditError {
    /// True when the original file is known to be untouched.
    pub fn is_read_side(&self) -> bool {
        matches!(self, EditError::Read { .. } | EditError::Decode { .. })
    }

    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            EditError::Read { path, .. }
            | EditError::Decode { path, .. }
            | EditError::Write { path, .. } => path,
        }
    }
}

pub type EditResult<T> = Result<T, EditError>;
