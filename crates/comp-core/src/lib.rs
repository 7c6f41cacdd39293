//! ============================================================================
//! COMP-CORE: Composition builder backend
//! ============================================================================
//! This crate handles all backend logic for the composition builder:
//! - Item identifier codec (`T<tier>_<base>[@<enchant>]`)
//! - Password gates for editing and viewing
//! - Item catalog, picker grouping and game-data import
//! - Embedded composition store via redb
//! - Discord sign-up template export
//! ============================================================================

pub mod access;
pub mod catalog;
pub mod composition;
pub mod config;
pub mod db;
pub mod export;
pub mod item_id;
pub mod service;
pub mod types;

// Re-export main types for convenience
pub use types::*;
pub use catalog::Catalog;
pub use config::ServerConfig;
pub use db::CompDb;
pub use service::{CompResult, CompService};
