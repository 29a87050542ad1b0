//! # Castellan Core
//!
//! Shared types for the Castellan RBAC workspace: the unified error type,
//! the principal model, filter expressions produced by conditions, and
//! dot-path helpers over JSON trees.

pub mod errors;
pub mod filter;
pub mod path;
pub mod principal;

pub use errors::{EngineError, Result};
pub use filter::{ConditionResult, FilterExpression};
pub use principal::{Principal, RoleRef, SUPER_ADMIN_CODE};
