//! ============================================================================
//! Access Module - Password gates on a composition
//! ============================================================================
//! Two independent locks guard every composition:
//!
//! - **Edit lock**: the admin password. Locked on load when one is stored;
//!   every write must present it.
//! - **Viewer lock**: the viewer password. Only enforced while the
//!   composition is not public.
//!
//! Passwords are compared as plaintext with exact, case-sensitive equality.
//! There is no lockout and no attempt counter.
//!
//! ## Usage
//! ```rust,ignore
//! use comp_core::access::AccessState;
//!
//! let mut access = AccessState::for_composition(&comp);
//! if access.edit.unlock(comp.password.as_deref(), "hunter2") { /* editable */ }
//! ```
//! ============================================================================

mod gate;
mod types;

pub use gate::{apply_password_change, authorize_write, has_password, is_view_locked, verify};
pub use types::{AccessState, EditLock, LockState, ViewerLock};
