//! Roles and the reserved super admin sentinel
//!
//! The role with code `strapi-super-admin` bypasses the ability engine and
//! is protected from mutation: the guards here run before any write path
//! touches a reserved role.

use castellan_core::{EngineError, Result, SUPER_ADMIN_CODE};
use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// A role owning a set of permissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Database id
    pub id: i64,
    /// Display name, freely editable
    pub name: String,
    /// Unique code; immutable for reserved roles
    pub code: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Permissions owned by the role (deleted in cascade with it)
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Create a role with no permissions
    pub fn new(id: i64, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            code: code.into(),
            description: None,
            permissions: Vec::new(),
        }
    }

    /// Whether this is the reserved super admin role
    pub fn is_super_admin(&self) -> bool {
        self.code == SUPER_ADMIN_CODE
    }
}

/// Reject edits or deletions of reserved roles before any mutation occurs
pub fn ensure_role_mutable(role: &Role) -> Result<()> {
    if role.is_super_admin() {
        return Err(EngineError::application(
            "the super admin role cannot be edited or deleted",
        ));
    }
    Ok(())
}

/// Reject removing a user from the super admin role when it would leave
/// the role empty
pub fn ensure_last_super_admin_remains(remaining_super_admins: usize) -> Result<()> {
    if remaining_super_admins == 0 {
        return Err(EngineError::application(
            "at least one super admin user must remain",
        ));
    }
    Ok(())
}
