//! Embeddable core library for authstrip.
//!
//! Provides a clap-free, I/O-abstracted entry point that scans a tree, rewrites
//! recognized authentication constructs and reports every per-file outcome.
//!
//! # Port traits
//!
//! File reads and writes go through [`SourceStore`](ports::SourceStore). The
//! [`adapters`] module provides the filesystem-backed implementation.
//!
//! # Entry points
//!
//! - [`run`](pipeline::run): scan, detect, rewrite and summarize

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod reporter;
pub mod settings;

pub use pipeline::{RunOutcome, ToolError, run};

// Re-export so embedders don't need authstrip-rules directly.
pub use authstrip_rules::{AccessPolicy, PatternRegistry};
