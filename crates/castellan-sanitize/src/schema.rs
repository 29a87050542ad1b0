//! Content-type schema metadata consumed by the sanitizer
//!
//! This is the interface of the external schema registry, reduced to what
//! field sanitization needs: per-attribute visibility, writability and the
//! kinds that get special treatment (passwords, admin-user relations).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Uid of the admin user model; relations targeting it are restricted to
/// an allow-list of identity fields regardless of permissions
pub const ADMIN_USER_UID: &str = "admin::user";

/// Creator attribute maintained by the system on every entity
pub const CREATED_BY_ATTRIBUTE: &str = "createdBy";

/// Updater attribute maintained by the system on every entity
pub const UPDATED_BY_ATTRIBUTE: &str = "updatedBy";

/// The only admin-user fields that may ever cross the trust boundary
pub const ADMIN_USER_ALLOWED_FIELDS: &[&str] = &["id", "firstname", "lastname", "username"];

/// What kind of value an attribute holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum AttributeKind {
    /// Short text
    String,
    /// Long text
    Text,
    /// Integer number
    Integer,
    /// Boolean flag
    Boolean,
    /// Arbitrary JSON blob
    Json,
    /// Email address
    Email,
    /// Secret; stripped from every payload and query unconditionally
    Password,
    /// Relation to another model
    Relation {
        /// Uid of the target model
        target: String,
    },
}

/// One attribute of a content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Value kind
    pub kind: AttributeKind,
    /// Hidden from payloads when false (schema configuration)
    pub visible: bool,
    /// Accepts writes when true
    pub writable: bool,
}

impl Attribute {
    /// A visible, writable attribute of the given kind
    pub fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            visible: true,
            writable: true,
        }
    }

    /// Mark the attribute hidden by schema configuration
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark the attribute read-only
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Whether this is a relation to the admin user model
    pub fn is_admin_user_relation(&self) -> bool {
        matches!(&self.kind, AttributeKind::Relation { target } if target == ADMIN_USER_UID)
    }
}

/// Schema of one content type, keyed by attribute name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeSchema {
    /// Content type uid; doubles as the ability subject
    pub uid: String,
    /// Attributes in declaration order
    pub attributes: IndexMap<String, Attribute>,
}

impl ContentTypeSchema {
    /// An empty schema for the given uid
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Add an attribute
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Look up one attribute
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Attribute names hidden by schema configuration
    pub fn non_visible_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| !attribute.visible)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Attribute names accepting writes
    pub fn writable_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.writable)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
