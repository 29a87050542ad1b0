//! # Castellan Domain
//!
//! Pure transformation functions over the `Permission` record and the
//! `Role` model. No I/O here: every operation returns a new value, leaving
//! its input untouched, so stored permissions can only be mutated through
//! the engine's higher-level services.

pub mod permission;
pub mod role;

pub use permission::Permission;
pub use role::{ensure_last_super_admin_remains, ensure_role_mutable, Role};
