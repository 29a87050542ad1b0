//! The action registry
//!
//! Keyed by computed action id, append-only while the registration window
//! is open, immutable after `seal()`. Lookups hand out shared `Arc` handles
//! so post-boot readers never observe partial state.

use std::sync::Arc;

use castellan_core::{EngineError, Result};
use indexmap::IndexMap;
use tracing::debug;

use crate::action::{Action, ActionDefinition};

/// Catalogue of every action the system understands
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: IndexMap<String, Arc<Action>>,
    sealed: bool,
}

impl ActionRegistry {
    /// Create an empty, unsealed registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single action.
    ///
    /// Fails with [`EngineError::RegistrationClosed`] once the registry is
    /// sealed, and with a validation error on shape violations or duplicate
    /// ids.
    pub fn register(&mut self, definition: ActionDefinition) -> Result<Arc<Action>> {
        if self.sealed {
            return Err(EngineError::registration_closed(
                "the action registry no longer accepts registrations after boot",
            ));
        }
        let action = Arc::new(definition.into_action()?);
        if self.actions.contains_key(&action.action_id) {
            return Err(EngineError::validation(format!(
                "action {} is already registered",
                action.action_id
            )));
        }
        self.actions.insert(action.action_id.clone(), action.clone());
        debug!(action = %action.action_id, "registered action");
        Ok(action)
    }

    /// Register a batch of actions, stopping at the first failure
    pub fn register_many(&mut self, definitions: Vec<ActionDefinition>) -> Result<()> {
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(())
    }

    /// Close the registration window
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether the registration window has closed
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// O(1) keyed lookup
    pub fn get(&self, action_id: &str) -> Option<Arc<Action>> {
        self.actions.get(action_id).cloned()
    }

    /// O(1) membership check
    pub fn has(&self, action_id: &str) -> bool {
        self.actions.contains_key(action_id)
    }

    /// All registered actions, in registration order
    pub fn values(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.actions.values()
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether the given action may be parameterized by `property`.
    ///
    /// Unknown actions answer `false`.
    pub fn applies_to_property(&self, property: &str, action_id: &str) -> bool {
        self.actions
            .get(action_id)
            .is_some_and(|action| action.applies_to_property(property))
    }

    /// Whether the given action applies to `subject`.
    ///
    /// Unknown actions and subject-less actions answer `false`.
    pub fn applies_to_subject(&self, subject: &str, action_id: &str) -> bool {
        self.actions
            .get(action_id)
            .is_some_and(|action| action.applies_to_subject(subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionSection;

    fn read_articles() -> ActionDefinition {
        ActionDefinition::new("explorer.read", ActionSection::ContentTypes, "Read")
            .plugin("content-manager")
            .subjects(vec!["api::article.article"])
            .apply_to_properties(vec!["fields"])
    }

    #[test]
    fn registration_is_keyed_by_computed_id() {
        let mut registry = ActionRegistry::new();
        registry.register(read_articles()).unwrap();

        assert!(registry.has("plugin::content-manager.explorer.read"));
        assert!(registry.get("plugin::content-manager.explorer.read").is_some());
        assert!(!registry.has("plugin::content-manager.explorer.delete"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn sealing_closes_the_registration_window() {
        let mut registry = ActionRegistry::new();
        registry.register(read_articles()).unwrap();
        registry.seal();

        let err = registry
            .register(
                ActionDefinition::new("marketplace.read", ActionSection::Settings, "Marketplace")
                    .plugin("admin")
                    .category("plugins"),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::RegistrationClosed { .. }));

        // Reads keep working after seal.
        assert!(registry.has("plugin::content-manager.explorer.read"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = ActionRegistry::new();
        registry.register(read_articles()).unwrap();
        let err = registry.register(read_articles()).unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn applicability_lookups_answer_false_for_unknown_actions() {
        let mut registry = ActionRegistry::new();
        registry.register(read_articles()).unwrap();

        let id = "plugin::content-manager.explorer.read";
        assert!(registry.applies_to_property("fields", id));
        assert!(!registry.applies_to_property("locales", id));
        assert!(registry.applies_to_subject("api::article.article", id));
        assert!(!registry.applies_to_subject("api::page.page", id));
        assert!(!registry.applies_to_property("fields", "api::ghost"));
        assert!(!registry.applies_to_subject("api::article.article", "api::ghost"));
    }
}
