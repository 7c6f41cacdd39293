//! ============================================================================
//! Access Types - Lock state for the edit and viewer gates
//! ============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gate::{has_password, is_view_locked, verify};
use crate::types::Composition;

/// State of the edit lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Locked,
    #[default]
    Unlocked,
}

/// Edit/admin lock. Starts locked when the record has an admin password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditLock {
    pub state: LockState,
}

impl EditLock {
    pub fn new(stored_password: Option<&str>) -> Self {
        let state = if has_password(stored_password) {
            LockState::Locked
        } else {
            LockState::Unlocked
        };
        Self { state }
    }

    pub fn is_locked(&self) -> bool {
        self.state == LockState::Locked
    }

    /// Try the supplied password. Returns true once unlocked; a wrong
    /// password leaves the state alone.
    pub fn unlock(&mut self, stored_password: Option<&str>, supplied: &str) -> bool {
        if !self.is_locked() {
            return true;
        }
        if verify(stored_password, supplied) {
            self.state = LockState::Unlocked;
            return true;
        }
        debug!("Edit unlock rejected");
        false
    }
}

/// Viewer lock. `has_access` is computed once at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerLock {
    pub has_access: bool,
}

impl ViewerLock {
    pub fn new(viewer_password: &str, is_public: bool) -> Self {
        Self {
            has_access: !is_view_locked(viewer_password, is_public),
        }
    }

    /// Grant access on an exact match of the viewer password
    pub fn unlock(&mut self, viewer_password: &str, supplied: &str) -> bool {
        if self.has_access {
            return true;
        }
        if supplied == viewer_password {
            self.has_access = true;
            return true;
        }
        debug!("Viewer unlock rejected");
        false
    }
}

/// Both locks for one loaded composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessState {
    pub edit: EditLock,
    pub viewer: ViewerLock,
}

impl AccessState {
    pub fn for_composition(comp: &Composition) -> Self {
        Self {
            edit: EditLock::new(comp.password.as_deref()),
            viewer: ViewerLock::new(&comp.viewer_password, comp.is_public),
        }
    }

    /// Editing needs the edit lock open; viewing needs viewer access
    pub fn can_edit(&self) -> bool {
        !self.edit.is_locked()
    }

    pub fn can_view(&self) -> bool {
        self.viewer.has_access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locked_comp() -> Composition {
        Composition {
            title: "ZvZ".into(),
            password: Some("secret".into()),
            viewer_password: "peek".into(),
            is_public: false,
            ..Composition::default()
        }
    }

    #[test]
    fn test_initial_states() {
        let access = AccessState::for_composition(&locked_comp());
        assert!(access.edit.is_locked());
        assert!(!access.can_view());

        let open = AccessState::for_composition(&Composition::default());
        assert!(open.can_edit());
        assert!(open.can_view());
    }

    #[test]
    fn test_edit_unlock_transitions() {
        let comp = locked_comp();
        let mut access = AccessState::for_composition(&comp);

        assert!(!access.edit.unlock(comp.password.as_deref(), "Secret"));
        assert!(access.edit.is_locked());

        assert!(access.edit.unlock(comp.password.as_deref(), "secret"));
        assert!(access.can_edit());
        // Viewer lock is untouched by the edit flow
        assert!(!access.can_view());
    }

    #[test]
    fn test_viewer_unlock_independent() {
        let comp = locked_comp();
        let mut access = AccessState::for_composition(&comp);

        assert!(!access.viewer.unlock(&comp.viewer_password, "PEEK"));
        assert!(access.viewer.unlock(&comp.viewer_password, "peek"));
        assert!(access.can_view());
        assert!(access.edit.is_locked());
    }

    #[test]
    fn test_public_overrides_viewer_password() {
        let comp = Composition {
            viewer_password: "peek".into(),
            is_public: true,
            ..Composition::default()
        };
        assert!(AccessState::for_composition(&comp).can_view());
    }

    #[test]
    fn test_empty_password_is_no_lock() {
        let comp = Composition {
            password: Some(String::new()),
            ..Composition::default()
        };
        assert!(!EditLock::new(comp.password.as_deref()).is_locked());
    }
}
