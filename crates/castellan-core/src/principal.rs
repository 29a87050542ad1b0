//! The acting principal whose access is being evaluated
//!
//! Two actor types share the ability engine: interactive admin users and
//! long-lived API/transfer tokens. Condition handlers are pure functions of
//! the principal only, so everything they may consult lives here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role code of the built-in super admin role.
///
/// A principal holding this role bypasses the ability engine entirely and
/// the role itself cannot be edited or deleted through the permission
/// services.
pub const SUPER_ADMIN_CODE: &str = "strapi-super-admin";

/// Lightweight reference to a role held by a principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    /// Database id of the role
    pub id: i64,
    /// Unique role code (stable across deployments, unlike the name)
    pub code: String,
}

impl RoleRef {
    /// Create a role reference
    pub fn new(id: i64, code: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
        }
    }
}

/// The authenticated actor being authorized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Principal {
    /// Interactive admin user, authorized through the roles it holds
    AdminUser {
        /// Database id of the user
        id: i64,
        /// Login email
        email: String,
        /// Roles whose permissions feed ability generation
        roles: Vec<RoleRef>,
        /// Free-form attributes consulted by condition handlers
        #[serde(default)]
        attributes: Map<String, Value>,
    },

    /// API or transfer token, authorized through its stored permission list
    Token {
        /// Database id of the token
        id: i64,
        /// Human-readable token name
        name: String,
    },
}

impl Principal {
    /// Create an admin user principal with no extra attributes
    pub fn admin_user(id: i64, email: impl Into<String>, roles: Vec<RoleRef>) -> Self {
        Self::AdminUser {
            id,
            email: email.into(),
            roles,
            attributes: Map::new(),
        }
    }

    /// Create a token principal
    pub fn token(id: i64, name: impl Into<String>) -> Self {
        Self::Token {
            id,
            name: name.into(),
        }
    }

    /// Database id of the underlying actor
    pub fn id(&self) -> i64 {
        match self {
            Self::AdminUser { id, .. } | Self::Token { id, .. } => *id,
        }
    }

    /// Roles held by the principal (empty for tokens)
    pub fn roles(&self) -> &[RoleRef] {
        match self {
            Self::AdminUser { roles, .. } => roles,
            Self::Token { .. } => &[],
        }
    }

    /// Whether the principal holds the reserved super admin role
    pub fn is_super_admin(&self) -> bool {
        self.roles().iter().any(|role| role.code == SUPER_ADMIN_CODE)
    }

    /// Look up a free-form attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        match self {
            Self::AdminUser { attributes, .. } => attributes.get(name),
            Self::Token { .. } => None,
        }
    }

    /// Attach a free-form attribute (no-op for tokens)
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        if let Self::AdminUser { attributes, .. } = &mut self {
            attributes.insert(name.into(), value);
        }
        self
    }
}
