//! The permissions manager
//!
//! Bound to one `(ability, action, schema)` triple, it rewrites entities
//! and queries so that nothing the principal cannot see, write, sort or
//! filter by crosses the trust boundary. Everything here strips rather
//! than errors: a sanitized payload is the product, not a verdict.

use std::sync::Arc;

use castellan_engine::Ability;
use serde_json::{Map, Value};
use tracing::debug;

use crate::schema::{
    Attribute, AttributeKind, ContentTypeSchema, ADMIN_USER_ALLOWED_FIELDS,
};

/// Ability-driven entity and query sanitizer
pub struct PermissionsManager {
    ability: Arc<Ability>,
    action: String,
    schema: ContentTypeSchema,
}

impl PermissionsManager {
    /// Bind an ability to an intended action over one content type
    pub fn new(ability: Arc<Ability>, action: impl Into<String>, schema: ContentTypeSchema) -> Self {
        Self {
            ability,
            action: action.into(),
            schema,
        }
    }

    /// The permitted-field union for this manager's action and subject.
    ///
    /// `None` means no matching rule declares a restriction: all fields
    /// are allowed (the inverse of the engine's empty-fields veto).
    pub fn permitted_fields(&self) -> Option<Vec<String>> {
        self.ability
            .permitted_fields(&self.action, Some(&self.schema.uid))
    }

    fn field_permitted(&self, field: &str) -> bool {
        self.ability
            .can(&self.action, Some(&self.schema.uid), Some(field))
    }

    /// Sanitize one write payload or an array of them.
    ///
    /// Removes fields hidden by schema configuration, read-only fields,
    /// fields outside the permitted set, password-typed fields, and role
    /// data nested under admin-user relations (`createdBy`/`updatedBy`).
    /// `id` always survives.
    pub fn validate_input(&self, entity: &Value) -> Value {
        match entity {
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.validate_input(item)).collect())
            }
            Value::Object(map) => {
                let hidden = self.schema.non_visible_attributes();
                let writable = self.schema.writable_attributes();
                let mut out = Map::new();
                for (name, value) in map {
                    if name == "id" {
                        out.insert(name.clone(), value.clone());
                        continue;
                    }
                    if hidden.contains(&name.as_str()) {
                        debug!(field = %name, "stripping non-visible field");
                        continue;
                    }
                    match self.schema.get(name) {
                        Some(Attribute {
                            kind: AttributeKind::Password,
                            ..
                        }) => {
                            debug!(field = %name, "stripping password field");
                        }
                        Some(_) if !writable.contains(&name.as_str()) => {
                            debug!(field = %name, "stripping read-only field");
                        }
                        Some(attribute) if attribute.is_admin_user_relation() => {
                            if self.field_permitted(name) {
                                out.insert(name.clone(), strip_admin_user(value));
                            }
                        }
                        _ => {
                            if self.field_permitted(name) {
                                out.insert(name.clone(), value.clone());
                            } else {
                                debug!(field = %name, "stripping field outside the permitted set");
                            }
                        }
                    }
                }
                Value::Object(out)
            }
            other => other.clone(),
        }
    }

    /// Sanitize a query object.
    ///
    /// The permitted-fields filter is applied independently to the
    /// `filters`, `sort` and `fields` clauses; clauses that become
    /// structurally empty are dropped entirely so an emptied filter never
    /// degrades into a match-all. Password fields and admin-user relation
    /// internals are stripped regardless of the ability.
    pub fn validate_query(&self, query: &Value) -> Value {
        let Some(map) = query.as_object() else {
            return query.clone();
        };
        let mut out = Map::new();
        for (clause, value) in map {
            match clause.as_str() {
                "filters" => {
                    if let Some(pruned) = self.prune_filter(value, false) {
                        out.insert(clause.clone(), pruned);
                    }
                }
                "sort" => {
                    if let Some(pruned) = self.prune_sort(value) {
                        out.insert(clause.clone(), pruned);
                    }
                }
                "fields" => {
                    if let Some(pruned) = self.prune_fields(value) {
                        out.insert(clause.clone(), pruned);
                    }
                }
                _ => {
                    out.insert(clause.clone(), value.clone());
                }
            }
        }
        Value::Object(out)
    }

    fn prune_filter(&self, value: &Value, inside_admin_user: bool) -> Option<Value> {
        match value {
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, nested) in map {
                    if key.starts_with('$') {
                        if let Some(pruned) = self.prune_filter(nested, inside_admin_user) {
                            out.insert(key.clone(), pruned);
                        }
                        continue;
                    }
                    if inside_admin_user {
                        if ADMIN_USER_ALLOWED_FIELDS.contains(&key.as_str()) {
                            if let Some(pruned) = self.prune_filter(nested, true) {
                                out.insert(key.clone(), pruned);
                            }
                        }
                        continue;
                    }
                    match self.schema.get(key) {
                        Some(attribute)
                            if !attribute.visible
                                || matches!(attribute.kind, AttributeKind::Password) =>
                        {
                            debug!(field = %key, "dropping filter on protected field");
                        }
                        Some(attribute) if attribute.is_admin_user_relation() => {
                            if self.field_permitted(key) {
                                if let Some(pruned) = self.prune_filter(nested, true) {
                                    out.insert(key.clone(), pruned);
                                }
                            }
                        }
                        _ => {
                            if self.field_permitted(key) {
                                if let Some(pruned) = self.prune_filter(nested, false) {
                                    out.insert(key.clone(), pruned);
                                }
                            }
                        }
                    }
                }
                (!out.is_empty()).then(|| Value::Object(out))
            }
            Value::Array(items) => {
                let kept: Vec<Value> = items
                    .iter()
                    .filter_map(|item| self.prune_filter(item, inside_admin_user))
                    .collect();
                (!kept.is_empty()).then(|| Value::Array(kept))
            }
            scalar => Some(scalar.clone()),
        }
    }

    fn prune_sort(&self, sort: &Value) -> Option<Value> {
        match sort {
            Value::String(entry) => self.sort_entry_allowed(entry).then(|| sort.clone()),
            Value::Array(items) => {
                let kept: Vec<Value> = items
                    .iter()
                    .filter(|item| {
                        item.as_str()
                            .is_some_and(|entry| self.sort_entry_allowed(entry))
                    })
                    .cloned()
                    .collect();
                (!kept.is_empty()).then(|| Value::Array(kept))
            }
            other => Some(other.clone()),
        }
    }

    fn sort_entry_allowed(&self, entry: &str) -> bool {
        // Entries look like "title", "title:desc" or "createdBy.firstname".
        let field = entry.split(':').next().unwrap_or(entry);
        let mut segments = field.split('.');
        let head = segments.next().unwrap_or(field);
        match self.schema.get(head) {
            Some(attribute) if attribute.is_admin_user_relation() => {
                attribute.visible
                    && self.field_permitted(head)
                    && segments
                        .next()
                        .map_or(true, |nested| ADMIN_USER_ALLOWED_FIELDS.contains(&nested))
            }
            Some(attribute) => {
                attribute.visible
                    && !matches!(attribute.kind, AttributeKind::Password)
                    && self.field_permitted(field)
            }
            None => self.field_permitted(field),
        }
    }

    fn prune_fields(&self, fields: &Value) -> Option<Value> {
        let items = fields.as_array()?;
        let kept: Vec<Value> = items
            .iter()
            .filter(|item| {
                item.as_str().is_some_and(|name| match self.schema.get(name) {
                    Some(attribute) => {
                        attribute.visible
                            && !matches!(attribute.kind, AttributeKind::Password)
                            && self.field_permitted(name)
                    }
                    None => self.field_permitted(name),
                })
            })
            .cloned()
            .collect();
        (!kept.is_empty()).then(|| Value::Array(kept))
    }
}

/// Keep only the allow-listed identity fields of an admin user value,
/// dropping role data and anything else
fn strip_admin_user(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(name, _)| ADMIN_USER_ALLOWED_FIELDS.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_admin_user).collect()),
        other => other.clone(),
    }
}
