//! ============================================================================
//! Access Gate - Password checks and admin write authorization
//! ============================================================================

use tracing::debug;

use crate::types::CompError;

/// True when a credential is actually set (present and non-empty)
pub fn has_password(stored: Option<&str>) -> bool {
    stored.is_some_and(|p| !p.is_empty())
}

/// Check a supplied password against the stored one.
///
/// No stored password means there is no lock: the check is skipped and any
/// input passes. Otherwise exact, case-sensitive equality.
pub fn verify(stored: Option<&str>, supplied: &str) -> bool {
    match stored {
        Some(expected) if !expected.is_empty() => expected == supplied,
        _ => true,
    }
}

/// A viewer password only locks a composition that isn't public
pub fn is_view_locked(viewer_password: &str, is_public: bool) -> bool {
    !is_public && !viewer_password.is_empty()
}

/// Authorize a write against the stored admin password
pub fn authorize_write(stored: Option<&str>, presented: Option<&str>) -> Result<(), CompError> {
    if !has_password(stored) {
        return Ok(());
    }
    match presented {
        Some(supplied) if verify(stored, supplied) => Ok(()),
        _ => {
            debug!("Admin write rejected: password mismatch");
            Err(CompError::WrongPassword)
        }
    }
}

/// Apply a requested password change. Only call after [`authorize_write`].
///
/// `None` keeps the stored password, `Some("")` removes it, anything else
/// replaces it.
pub fn apply_password_change(stored: &mut Option<String>, next_password: Option<String>) {
    match next_password {
        None => {}
        Some(next) if next.is_empty() => {
            debug!("Admin password removed");
            *stored = None;
        }
        Some(next) => {
            debug!("Admin password replaced");
            *stored = Some(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_without_stored_password() {
        assert!(verify(None, ""));
        assert!(verify(Some(""), "anything"));
        assert!(verify(None, "anything"));
    }

    #[test]
    fn test_verify_case_sensitive() {
        assert!(verify(Some("secret"), "secret"));
        assert!(!verify(Some("secret"), "Secret"));
        assert!(!verify(Some("secret"), ""));
        assert!(!verify(Some("secret"), "secret "));
    }

    #[test]
    fn test_view_lock_rules() {
        assert!(is_view_locked("peek", false));
        assert!(!is_view_locked("peek", true));
        assert!(!is_view_locked("", false));
    }

    #[test]
    fn test_authorize_write() {
        assert!(authorize_write(None, None).is_ok());
        assert!(authorize_write(Some(""), Some("x")).is_ok());
        assert!(authorize_write(Some("secret"), Some("secret")).is_ok());
        assert_eq!(
            authorize_write(Some("secret"), None),
            Err(CompError::WrongPassword)
        );
        assert_eq!(
            authorize_write(Some("secret"), Some("nope")),
            Err(CompError::WrongPassword)
        );
    }

    #[test]
    fn test_password_change_presence_not_truthiness() {
        let mut stored = Some("old".to_string());
        apply_password_change(&mut stored, None);
        assert_eq!(stored.as_deref(), Some("old"));

        apply_password_change(&mut stored, Some("new".into()));
        assert_eq!(stored.as_deref(), Some("new"));

        apply_password_change(&mut stored, Some(String::new()));
        assert_eq!(stored, None);
    }

    #[test]
    fn test_repeated_attempts_allowed() {
        for _ in 0..100 {
            assert!(!verify(Some("secret"), "guess"));
        }
        assert!(verify(Some("secret"), "secret"));
    }
}
