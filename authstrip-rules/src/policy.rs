use crate::error::RuleError;
use crate::registry::PatternRegistry;
use serde::Deserialize;

pub const DEFAULT_USER_ID: &str = "local-user";

/// Which access capability rewritten call sites should reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    Enforcing,
    #[default]
    Permissive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Keep real verification. No rules apply.
    Enforcing,
    /// Every check grants access as `user_id`.
    Permissive { user_id: String },
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

impl AccessPolicy {
    pub fn permissive() -> Self {
        Self::Permissive {
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }

    pub fn from_mode(mode: PolicyMode, user_id: Option<&str>) -> Result<Self, RuleError> {
        match mode {
            PolicyMode::Enforcing => Ok(Self::Enforcing),
            PolicyMode::Permissive => {
                let user_id = user_id.unwrap_or(DEFAULT_USER_ID);
                validate_user_id(user_id)?;
                Ok(Self::Permissive {
                    user_id: user_id.to_string(),
                })
            }
        }
    }

    pub fn mode(&self) -> PolicyMode {
        match self {
            Self::Enforcing => PolicyMode::Enforcing,
            Self::Permissive { .. } => PolicyMode::Permissive,
        }
    }

    pub fn registry(&self) -> Result<PatternRegistry, RuleError> {
        PatternRegistry::for_policy(self)
    }
}

/// The id is spliced into a Python string literal.
pub(crate) fn validate_user_id(user_id: &str) -> Result<(), RuleError> {
    let bad = user_id.is_empty()
        || user_id
            .chars()
            .any(|c| matches!(c, '"' | '\'' | '\\' | '\n' | '\r'));
    if bad {
        return Err(RuleError::InvalidUserId(user_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_permissive_local_user() {
        assert_eq!(
            AccessPolicy::default(),
            AccessPolicy::Permissive {
                user_id: "local-user".to_string()
            }
        );
        assert_eq!(AccessPolicy::default().mode(), PolicyMode::Permissive);
    }

    #[test]
    fn from_mode_rejects_quoted_user_id() {
        let err = AccessPolicy::from_mode(PolicyMode::Permissive, Some("a\"b")).unwrap_err();
        assert!(matches!(err, RuleError::InvalidUserId(_)));
    }

    #[test]
    fn from_mode_enforcing_ignores_user_id() {
        let p = AccessPolicy::from_mode(PolicyMode::Enforcing, Some("whatever")).unwrap();
        assert_eq!(p, AccessPolicy::Enforcing);
    }
}
