//! # Castellan Sanitize
//!
//! The permissions manager: given an ability, a content-type schema and an
//! intended action, strips the fields and query clauses the principal is
//! not permitted to read, write, sort or filter by. Password-typed fields
//! and admin-user relation internals are stripped unconditionally, whatever
//! the ability says.

pub mod manager;
pub mod schema;

pub use manager::PermissionsManager;
pub use schema::{
    Attribute, AttributeKind, ContentTypeSchema, ADMIN_USER_ALLOWED_FIELDS, ADMIN_USER_UID,
    CREATED_BY_ATTRIBUTE, UPDATED_BY_ATTRIBUTE,
};
