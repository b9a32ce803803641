use thiserror::Error;

use super::domain::{RoleKey, UserKey};

/// Failures of credential store operations.
///
/// Each variant names the identifiers involved so callers can report them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("the user ({user}) was not found")]
    UserNotFound { user: UserKey },
    #[error("the user ({user}) does not have the role ({role})")]
    RoleNotFound { user: UserKey, role: RoleKey },
    #[error("the user ({user}) is not unique")]
    UserNotUnique { user: UserKey },
    #[error("login failed for user ({user})")]
    LoginFailed { user: UserKey },
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::UserNotFound { .. } => 1001,
            AuthError::RoleNotFound { .. } => 1002,
            AuthError::UserNotUnique { .. } => 1003,
            AuthError::LoginFailed { .. } => 1004,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_keys() {
        let err = AuthError::RoleNotFound { user: "alice".into(), role: RoleKey::admin() };
        assert_eq!(err.to_string(), "the user (alice) does not have the role (auth.admin)");
        assert_eq!(AuthError::LoginFailed { user: "bob".into() }.to_string(), "login failed for user (bob)");
        assert_eq!(AuthError::UserNotUnique { user: "".into() }.to_string(), "the user () is not unique");
    }
}
