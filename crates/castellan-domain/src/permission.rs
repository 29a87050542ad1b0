//! The Permission record and its pure transforms
//!
//! A permission is a persisted grant of one action, optionally scoped to a
//! subject, a property set (`properties`, e.g. field lists) and a list of
//! condition ids. All transforms here are non-destructive.

use castellan_core::path::{delete_path, get_path, set_path};
use castellan_core::{EngineError, Result};
use castellan_registry::ConditionRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// A persisted grant of one action to a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Database id, absent until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Owning role id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<i64>,
    /// Registered action id this grant references
    pub action: String,
    /// Subject uid the grant is scoped to, if any
    #[serde(default)]
    pub subject: Option<String>,
    /// Action parameterization (e.g. `{"fields": ["title"]}`)
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Condition ids attached to the grant
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl Permission {
    /// Build a default-shaped permission for an action
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            id: None,
            role: None,
            action: action.into(),
            subject: None,
            properties: Map::new(),
            conditions: Vec::new(),
        }
    }

    /// Build a permission from raw input, whitelisting known fields and
    /// filling defaults.
    ///
    /// Only `action`, `subject`, `properties` and `conditions` are read;
    /// anything else in the input is ignored. `action` is required.
    pub fn create(raw: &Value) -> Result<Self> {
        let action = raw
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::validation("action is a required field"))?;

        let subject = raw
            .get("subject")
            .and_then(Value::as_str)
            .map(str::to_string);

        let properties = raw
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let conditions = raw
            .get("conditions")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id: None,
            role: None,
            action: action.to_string(),
            subject,
            properties,
            conditions,
        })
    }

    /// Set the subject scope
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Add a condition id; adding an existing id is a no-op
    pub fn add_condition(&self, id: impl Into<String>) -> Self {
        let id = id.into();
        let mut next = self.clone();
        if !next.conditions.contains(&id) {
            next.conditions.push(id);
        }
        next
    }

    /// Remove a condition id, preserving the order of the rest
    pub fn remove_condition(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.conditions.retain(|existing| existing != id);
        next
    }

    /// Read a (possibly nested) property by dot path
    pub fn property(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.properties.get(head)?;
        match rest {
            Some(rest) => get_path(value, rest),
            None => Some(value),
        }
    }

    /// Return a copy with the property at `path` set to `value`
    pub fn with_property(&self, path: &str, value: Value) -> Self {
        let mut next = self.clone();
        let mut properties = Value::Object(std::mem::take(&mut next.properties));
        set_path(&mut properties, path, value);
        if let Value::Object(map) = properties {
            next.properties = map;
        }
        next
    }

    /// Return a copy with the property at `path` removed
    pub fn without_property(&self, path: &str) -> Self {
        let mut next = self.clone();
        let mut properties = Value::Object(std::mem::take(&mut next.properties));
        delete_path(&mut properties, path);
        if let Value::Object(map) = properties {
            next.properties = map;
        }
        next
    }

    /// Drop condition ids no longer present in the registry.
    ///
    /// Self-heals permissions whose conditions were removed from the
    /// codebase between deployments; never fails.
    pub fn sanitize_conditions(&self, registry: &ConditionRegistry) -> Self {
        let mut next = self.clone();
        next.conditions.retain(|id| {
            let known = registry.has(id);
            if !known {
                debug!(condition = %id, action = %self.action, "dropping stale condition id");
            }
            known
        });
        next
    }

    /// The `fields` property as a string list, when present.
    ///
    /// `Some(vec![])` (an explicit empty grant) is distinct from `None`
    /// (no field restriction at all); the engine treats the former as a
    /// veto and the sanitizer treats the latter as unrestricted.
    pub fn fields(&self) -> Option<Vec<String>> {
        self.properties.get("fields").and_then(Value::as_array).map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    fn arb_condition_id() -> impl Strategy<Value = String> {
        "[a-z]{2,8}::[a-z-]{2,12}"
    }

    fn arb_permission() -> impl Strategy<Value = Permission> {
        (
            "[a-z:.]{3,20}",
            proptest::collection::vec(arb_condition_id(), 0..5),
        )
            .prop_map(|(action, conditions)| {
                let mut permission = Permission::new(action);
                for id in conditions {
                    permission = permission.add_condition(id);
                }
                permission
            })
    }

    proptest! {
        #[test]
        fn add_condition_is_idempotent(permission in arb_permission(), id in arb_condition_id()) {
            let once = permission.add_condition(&id);
            let twice = once.add_condition(&id);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn remove_inverts_add_when_absent(permission in arb_permission(), id in arb_condition_id()) {
            prop_assume!(!permission.conditions.contains(&id));
            let round_trip = permission.add_condition(&id).remove_condition(&id);
            prop_assert_eq!(round_trip, permission);
        }
    }
}
