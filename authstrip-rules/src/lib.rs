//! Pattern registry and detector for authstrip.
//!
//! A [`PatternRegistry`] is an explicit value built once per run, either from the
//! builtin catalog for an [`AccessPolicy`] or from caller-supplied rules. The
//! [`Detector`] tests content against the registry without mutating anything.
//!
//! Residual patterns flag auth references that no rule rewrites, so a run
//! never looks clean while checks remain.
//!
//! Rules are applied to raw text. Replacement output must never satisfy any
//! rule's match side; the builtin catalog upholds this and the tests check it.

pub mod catalog;
mod detector;
mod error;
mod policy;
mod registry;
mod residual;
mod rule;

pub use detector::{Detector, ScanResult};
pub use error::RuleError;
pub use policy::{AccessPolicy, DEFAULT_USER_ID, PolicyMode};
pub use registry::{ImportMarker, PatternRegistry};
pub use residual::ResidualPattern;
pub use rule::{PatternRule, ReplaceFn, Replacement};
