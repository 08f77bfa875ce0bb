use thiserror::Error;

/// Errors raised while building rules or a registry.
///
/// All of these are fatal for a run: a registry is validated before any file is scanned.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern for rule `{id}`: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern for rule `{id}` matches the empty string")]
    EmptyMatch { id: String },

    #[error("duplicate rule id `{0}`")]
    DuplicateId(String),

    #[error("rule id must not be empty")]
    EmptyId,

    #[error("import marker detect string must not be empty")]
    EmptyMarker,

    #[error("invalid user id {0:?}: quotes, backslashes and line breaks are not allowed")]
    InvalidUserId(String),

    #[error("could not build pattern set: {0}")]
    PatternSet(#[source] regex::Error),
}
