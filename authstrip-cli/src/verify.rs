//! Post-run check that the backend's own settings enable no-auth mode.
//!
//! Rewriting call sites is not enough when the backend also gates auth on a
//! settings flag; a `[verify]` section names the file and the line it must hold.

use crate::config::VerifySection;
use camino::Utf8Path;
use fs_err as fs;

/// `None` when the file contains the expected text, otherwise a warning.
pub fn verify_setting(root: &Utf8Path, check: &VerifySection) -> Option<String> {
    let path = root.join(&check.file);
    match fs::read_to_string(&path) {
        Ok(contents) if contents.contains(&check.contains) => None,
        Ok(_) => Some(format!(
            "{} does not contain `{}`; the backend may still enforce auth",
            check.file, check.contains
        )),
        Err(err) => Some(format!("cannot verify {}: {err}", check.file)),
    }
}
