//! Shared DTOs (schemas-as-code) for the authstrip workspace.
//!
//! # Design constraints
//! - These types are serialized to disk as run reports.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod outcome;
pub mod rule;
pub mod summary;

/// Schema identifiers.
pub mod schema {
    pub const AUTHSTRIP_RUN_V1: &str = "authstrip.run.v1";
}
