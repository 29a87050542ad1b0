//! Actions: the named capabilities permissions reference
//!
//! Every action id is derived deterministically from `(plugin, uid)` so the
//! same registration always lands on the same key. The registration input
//! (`ActionDefinition`) is shaped into the stored `Action` according to its
//! section before it enters the registry.

use castellan_core::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Where an action surfaces in the admin permission UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionSection {
    /// CRUD over content entities; always scoped to subjects
    ContentTypes,
    /// Plugin-owned capabilities
    Plugins,
    /// Settings screens, grouped by category and sub-category
    Settings,
    /// Engine-internal capabilities, never listed to the UI
    Internal,
}

/// Compute the unique action id from the owning plugin and local uid.
///
/// - no plugin: `api::<uid>`
/// - the `admin` plugin: `admin::<uid>`
/// - any other plugin: `plugin::<plugin>.<uid>`
///
/// Condition ids share the same namespacing scheme.
pub fn compute_action_id(plugin: Option<&str>, uid: &str) -> String {
    match plugin {
        None => format!("api::{uid}"),
        Some("admin") => format!("admin::{uid}"),
        Some(plugin) => format!("plugin::{plugin}.{uid}"),
    }
}

/// Parameterization options of an action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOptions {
    /// Property names a permission for this action may carry (e.g. `fields`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_to_properties: Option<Vec<String>>,
}

/// Registration input for an action, before id computation and shaping
#[derive(Debug, Clone)]
pub struct ActionDefinition {
    /// Local uid, unique within the owning plugin
    pub uid: String,
    /// Owning plugin, if any
    pub plugin: Option<String>,
    /// UI section
    pub section: ActionSection,
    /// Human-readable name
    pub display_name: String,
    /// Settings category (settings actions only)
    pub category: Option<String>,
    /// Settings/plugins sub-category
    pub sub_category: Option<String>,
    /// Subject uids the action applies to (content-types actions only)
    pub subjects: Option<Vec<String>>,
    /// Properties the action may be parameterized by
    pub apply_to_properties: Option<Vec<String>>,
}

impl ActionDefinition {
    /// Start a definition with the mandatory fields
    pub fn new(uid: impl Into<String>, section: ActionSection, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            plugin: None,
            section,
            display_name: display_name.into(),
            category: None,
            sub_category: None,
            subjects: None,
            apply_to_properties: None,
        }
    }

    /// Set the owning plugin
    pub fn plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Set the settings category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the settings/plugins sub-category
    pub fn sub_category(mut self, sub_category: impl Into<String>) -> Self {
        self.sub_category = Some(sub_category.into());
        self
    }

    /// Set the subjects the action applies to
    pub fn subjects(mut self, subjects: Vec<impl Into<String>>) -> Self {
        self.subjects = Some(subjects.into_iter().map(Into::into).collect());
        self
    }

    /// Set the properties the action may be parameterized by
    pub fn apply_to_properties(mut self, properties: Vec<impl Into<String>>) -> Self {
        self.apply_to_properties = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    /// Compute the id and shape section-dependent fields for storage
    pub(crate) fn into_action(self) -> Result<Action> {
        let action_id = compute_action_id(self.plugin.as_deref(), &self.uid);

        if self.section != ActionSection::ContentTypes && self.subjects.is_some() {
            return Err(EngineError::validation(format!(
                "subjects is only valid for content-types actions ({action_id})"
            )));
        }

        let (category, sub_category, subjects) = match self.section {
            ActionSection::ContentTypes => {
                let subjects = self.subjects.ok_or_else(|| {
                    EngineError::validation(format!(
                        "subjects is required for content-types actions ({action_id})"
                    ))
                })?;
                (None, None, Some(subjects))
            }
            ActionSection::Settings => {
                let category = self.category.ok_or_else(|| {
                    EngineError::validation(format!(
                        "category is required for settings actions ({action_id})"
                    ))
                })?;
                let sub_category = self.sub_category.unwrap_or_else(|| "general".to_string());
                (Some(category), Some(sub_category), None)
            }
            ActionSection::Plugins => {
                let sub_category = self.sub_category.unwrap_or_else(|| "general".to_string());
                (None, Some(sub_category), None)
            }
            ActionSection::Internal => (None, None, None),
        };

        Ok(Action {
            action_id,
            section: self.section,
            display_name: self.display_name,
            plugin: self.plugin,
            category,
            sub_category,
            subjects,
            options: ActionOptions {
                apply_to_properties: self.apply_to_properties,
            },
        })
    }
}

/// A registered action, immutable once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique key in the registry, derived from `(plugin, uid)`
    pub action_id: String,
    /// UI section
    pub section: ActionSection,
    /// Human-readable name
    pub display_name: String,
    /// Owning plugin, if any
    pub plugin: Option<String>,
    /// Settings category (settings actions only)
    pub category: Option<String>,
    /// Sub-category (settings and plugins actions only)
    pub sub_category: Option<String>,
    /// Subject uids (content-types actions only)
    pub subjects: Option<Vec<String>>,
    /// Parameterization options
    pub options: ActionOptions,
}

impl Action {
    /// Whether a permission for this action may carry the given property
    pub fn applies_to_property(&self, property: &str) -> bool {
        self.options
            .apply_to_properties
            .as_deref()
            .is_some_and(|properties| properties.iter().any(|p| p == property))
    }

    /// Whether the action applies to the given subject uid
    pub fn applies_to_subject(&self, subject: &str) -> bool {
        self.subjects
            .as_deref()
            .is_some_and(|subjects| subjects.iter().any(|s| s == subject))
    }
}
