//! The condition registry
//!
//! Same registration-window contract as the action registry, plus observer
//! hooks fired around each registration so sibling subsystems can react
//! without being hard-coded here.

use std::fmt;
use std::sync::Arc;

use castellan_core::{EngineError, Result};
use indexmap::IndexMap;
use tracing::debug;

use crate::condition::{Condition, ConditionDefinition};

type RegisterObserver = Box<dyn Fn(&Condition) + Send + Sync>;

/// Catalogue of every condition permissions may reference
#[derive(Default)]
pub struct ConditionRegistry {
    conditions: IndexMap<String, Arc<Condition>>,
    sealed: bool,
    will_register: Vec<RegisterObserver>,
    did_register: Vec<RegisterObserver>,
}

impl ConditionRegistry {
    /// Create an empty, unsealed registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer fired just before each condition is stored
    pub fn on_will_register(&mut self, observer: impl Fn(&Condition) + Send + Sync + 'static) {
        self.will_register.push(Box::new(observer));
    }

    /// Add an observer fired just after each condition is stored
    pub fn on_did_register(&mut self, observer: impl Fn(&Condition) + Send + Sync + 'static) {
        self.did_register.push(Box::new(observer));
    }

    /// Register a single condition.
    ///
    /// Observers run synchronously, in the order they were added.
    pub fn register(&mut self, definition: ConditionDefinition) -> Result<Arc<Condition>> {
        if self.sealed {
            return Err(EngineError::registration_closed(
                "the condition registry no longer accepts registrations after boot",
            ));
        }
        let condition = Arc::new(definition.into_condition());
        if self.conditions.contains_key(&condition.id) {
            return Err(EngineError::validation(format!(
                "condition {} is already registered",
                condition.id
            )));
        }
        for observer in &self.will_register {
            observer(&condition);
        }
        self.conditions.insert(condition.id.clone(), condition.clone());
        for observer in &self.did_register {
            observer(&condition);
        }
        debug!(condition = %condition.id, "registered condition");
        Ok(condition)
    }

    /// Register a batch of conditions, stopping at the first failure
    pub fn register_many(&mut self, definitions: Vec<ConditionDefinition>) -> Result<()> {
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
    pub fn get(&self, id: &str) -> Option<Arc<Condition>> {
        self.conditions.get(id).cloned()
    }

    /// Conditions matching an arbitrary predicate, in registration order
    pub fn get_where(&self, predicate: impl Fn(&Condition) -> bool) -> Vec<Arc<Condition>> {
        self.conditions
            .values()
            .filter(|condition| predicate(condition))
            .cloned()
            .collect()
    }

    /// O(1) membership check
    pub fn has(&self, id: &str) -> bool {
        self.conditions.contains_key(id)
    }

    /// All registered ids, in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    /// All registered conditions, in registration order
    pub fn values(&self) -> impl Iterator<Item = &Arc<Condition>> {
        self.conditions.values()
    }

    /// Number of registered conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Drop every registered condition.
    ///
    /// A boot-time affordance; honors the registration window like writes.
    pub fn clear(&mut self) -> Result<()> {
        if self.sealed {
            return Err(EngineError::registration_closed(
                "the condition registry no longer accepts writes after boot",
            ));
        }
        self.conditions.clear();
        Ok(())
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionRegistry")
            .field("conditions", &self.conditions)
            .field("sealed", &self.sealed)
            .field("will_register", &self.will_register.len())
            .field("did_register", &self.did_register.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castellan_core::ConditionResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn is_creator() -> ConditionDefinition {
        ConditionDefinition::from_fn("is-creator", "Is creator", |_| ConditionResult::Allow)
            .plugin("admin")
    }

    #[test]
    fn registration_and_lookup() {
        let mut registry = ConditionRegistry::new();
        registry.register(is_creator()).unwrap();

        assert!(registry.has("admin::is-creator"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["admin::is-creator"]);
        assert_eq!(registry.get_where(|c| c.category == "default").len(), 1);
        assert!(registry.get_where(|c| c.category == "time").is_empty());
    }

    #[test]
    fn observers_fire_once_per_registration_in_order() {
        static WILL: AtomicUsize = AtomicUsize::new(0);
        static DID: AtomicUsize = AtomicUsize::new(0);

        let mut registry = ConditionRegistry::new();
        registry.on_will_register(|condition| {
            assert_eq!(condition.id, "admin::is-creator");
            WILL.fetch_add(1, Ordering::SeqCst);
        });
        registry.on_did_register(|_| {
            // will_register must already have run
            assert_eq!(WILL.load(Ordering::SeqCst), 1);
            DID.fetch_add(1, Ordering::SeqCst);
        });

        registry.register(is_creator()).unwrap();
        assert_eq!(WILL.load(Ordering::SeqCst), 1);
        assert_eq!(DID.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sealed_registry_rejects_writes_and_clear() {
        let mut registry = ConditionRegistry::new();
        registry.register(is_creator()).unwrap();
        registry.seal();

        let err = registry
            .register(ConditionDefinition::from_fn("late", "Late", |_| {
                ConditionResult::Allow
            }))
            .unwrap_err();
        assert!(matches!(err, EngineError::RegistrationClosed { .. }));
        assert!(matches!(
            registry.clear().unwrap_err(),
            EngineError::RegistrationClosed { .. }
        ));

        // Reads keep working after seal.
        assert!(registry.has("admin::is-creator"));
    }

    #[test]
    fn clear_empties_an_unsealed_registry() {
        let mut registry = ConditionRegistry::new();
        registry.register(is_creator()).unwrap();
        registry.clear().unwrap();
        assert!(registry.is_empty());
    }
}
