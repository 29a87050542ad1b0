//! # Castellan Engine
//!
//! Converts a principal's stored permissions into an executable
//! authorization decision function (an [`Ability`]) and evaluates
//! "can principal perform action on subject/field" queries against it.
//!
//! Stored permissions are untrusted: each one runs through an evaluation
//! pipeline (validate, format, post-validate) that silently drops anything
//! referencing since-removed actions, properties or conditions. A drifted
//! permission costs the principal that capability; it never crashes
//! authorization for the rest of their rules.

pub mod ability;
pub mod check;
pub mod engine;
mod pipeline;
pub mod provider;
pub mod service;

pub use ability::{Ability, AbilityRule, ALL_SUBJECT};
pub use check::{check_many, check_many_with, parse_check_payload, PermissionCheck};
pub use engine::AbilityEngine;
pub use provider::{PermissionStore, PermissionsProvider};
pub use service::{
    available_actions, available_conditions, clean_permissions_in_database,
    permissions_list_payload, ReconcileOptions, ReconcileReport,
};
