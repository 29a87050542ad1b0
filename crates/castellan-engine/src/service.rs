//! Permission services around the engine
//!
//! The `GET /permissions` payload builders consumed by the HTTP layer, and
//! the batch reconciliation that re-aligns persisted permissions with the
//! live registries after a deployment removed actions or conditions.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use castellan_registry::{ActionRegistry, ActionSection, ConditionRegistry};

use crate::provider::PermissionStore;

/// Tuning knobs for [`clean_permissions_in_database`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Permissions fetched per page
    pub page_size: usize,
    /// In-flight permission updates at any time
    pub max_concurrent_updates: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            page_size: 200,
            max_concurrent_updates: 100,
        }
    }
}

/// What a reconciliation pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Permissions deleted (unknown action or inapplicable subject)
    pub deleted: usize,
    /// Permissions rewritten (stale condition ids removed)
    pub updated: usize,
}

/// Delete or heal persisted permissions that drifted from the registries.
///
/// Pages through the permission table (bounding memory) and, per page,
/// deletes permissions whose action is unknown or whose subject no longer
/// applies, and rewrites permissions whose condition list shrank after
/// sanitization. Updates run concurrently up to
/// `options.max_concurrent_updates`.
pub async fn clean_permissions_in_database(
    store: &dyn PermissionStore,
    actions: &ActionRegistry,
    conditions: &ConditionRegistry,
    options: &ReconcileOptions,
) -> castellan_core::Result<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let mut page = 1;
    loop {
        let batch = store.find_page(page, options.page_size).await?;
        let batch_len = batch.len();

        let mut to_delete = Vec::new();
        let mut updates = Vec::new();
        for permission in batch {
            let action_known = actions.has(&permission.action);
            let subject_applies = match &permission.subject {
                Some(subject) => actions.applies_to_subject(subject, &permission.action),
                None => true,
            };
            if !action_known || !subject_applies {
                warn!(
                    action = %permission.action,
                    subject = permission.subject.as_deref().unwrap_or("all"),
                    "deleting permission that drifted from the action registry"
                );
                if let Some(id) = permission.id {
                    to_delete.push(id);
                }
                continue;
            }

            let healed = permission.sanitize_conditions(conditions);
            if healed.conditions != permission.conditions {
                debug!(action = %healed.action, "rewriting permission with stale conditions");
                if let Some(id) = healed.id {
                    updates.push((id, healed));
                }
            }
        }

        if !to_delete.is_empty() {
            report.deleted += to_delete.len();
            store.delete_by_ids(&to_delete).await?;
        }

        report.updated += updates.len();
        stream::iter(
            updates
                .into_iter()
                .map(|(id, permission)| async move { store.update(id, &permission).await }),
        )
        .buffer_unordered(options.max_concurrent_updates)
        .try_collect::<Vec<()>>()
        .await?;

        if batch_len < options.page_size {
            break;
        }
        page += 1;
    }
    Ok(report)
}

/// The `conditions` half of the `GET /permissions` payload
pub fn available_conditions(conditions: &ConditionRegistry) -> Value {
    Value::Array(
        conditions
            .values()
            .map(|condition| {
                json!({
                    "id": condition.id,
                    "displayName": condition.display_name,
                    "category": condition.category,
                })
            })
            .collect(),
    )
}

/// The `sections` half of the `GET /permissions` payload.
///
/// Actions grouped by section; internal actions are never listed.
pub fn available_actions(actions: &ActionRegistry) -> Value {
    let mut content_types = Vec::new();
    let mut plugins = Vec::new();
    let mut settings = Vec::new();

    for action in actions.values() {
        match action.section {
            ActionSection::ContentTypes => content_types.push(json!({
                "actionId": action.action_id,
                "displayName": action.display_name,
                "subjects": action.subjects,
            })),
            ActionSection::Plugins => plugins.push(json!({
                "actionId": action.action_id,
                "displayName": action.display_name,
                "plugin": action.plugin,
                "subCategory": action.sub_category,
            })),
            ActionSection::Settings => settings.push(json!({
                "actionId": action.action_id,
                "displayName": action.display_name,
                "category": action.category,
                "subCategory": action.sub_category,
            })),
            ActionSection::Internal => {}
        }
    }

    json!({
        "contentTypes": content_types,
        "plugins": plugins,
        "settings": settings,
    })
}

/// The full `GET /permissions` response body
pub fn permissions_list_payload(
    actions: &ActionRegistry,
    conditions: &ConditionRegistry,
) -> Value {
    json!({
        "data": {
            "conditions": available_conditions(conditions),
            "sections": available_actions(actions),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use castellan_core::{ConditionResult, Result};
    use castellan_domain::Permission;
    use castellan_registry::{ActionDefinition, ConditionDefinition};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Store whose pages come from a stable snapshot while mutations are
    /// recorded on the side, like a cursor over the permission table.
    struct SnapshotStore {
        snapshot: Vec<Permission>,
        deleted: Mutex<Vec<i64>>,
        updated: Mutex<HashMap<i64, Permission>>,
    }

    impl SnapshotStore {
        fn new(snapshot: Vec<Permission>) -> Self {
            Self {
                snapshot,
                deleted: Mutex::new(Vec::new()),
                updated: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl PermissionStore for SnapshotStore {
        async fn find_page(&self, page: usize, page_size: usize) -> Result<Vec<Permission>> {
            let start = (page - 1) * page_size;
            Ok(self
                .snapshot
                .iter()
                .skip(start)
                .take(page_size)
                .cloned()
                .collect())
        }

        async fn delete_by_ids(&self, ids: &[i64]) -> Result<()> {
            self.deleted.lock().unwrap().extend_from_slice(ids);
            Ok(())
        }

        async fn update(&self, id: i64, permission: &Permission) -> Result<()> {
            self.updated.lock().unwrap().insert(id, permission.clone());
            Ok(())
        }
    }

    fn registries() -> (ActionRegistry, ConditionRegistry) {
        let mut actions = ActionRegistry::new();
        actions
            .register(
                ActionDefinition::new("explorer.read", ActionSection::ContentTypes, "Read")
                    .plugin("content-manager")
                    .subjects(vec!["api::article.article"]),
            )
            .unwrap();
        actions
            .register(
                ActionDefinition::new("marketplace.read", ActionSection::Settings, "Marketplace")
                    .plugin("admin")
                    .category("plugins and marketplace")
                    .sub_category("marketplace"),
            )
            .unwrap();
        actions.seal();

        let mut conditions = ConditionRegistry::new();
        conditions
            .register(
                ConditionDefinition::from_fn("is-creator", "Is creator", |_| {
                    ConditionResult::Allow
                })
                .plugin("admin"),
            )
            .unwrap();
        conditions.seal();
        (actions, conditions)
    }

    fn stored(id: i64, action: &str) -> Permission {
        let mut permission = Permission::new(action);
        permission.id = Some(id);
        permission
    }

    #[tokio::test]
    async fn reconciliation_deletes_drifted_and_heals_stale_permissions() {
        let (actions, conditions) = registries();
        const READ: &str = "plugin::content-manager.explorer.read";

        let store = SnapshotStore::new(vec![
            // Unknown action: deleted.
            stored(1, "plugin::uninstalled.read"),
            // Subject no longer applies: deleted.
            stored(2, READ).with_subject("api::removed.removed"),
            // Stale condition id: healed in place.
            stored(3, READ)
                .with_subject("api::article.article")
                .add_condition("admin::is-creator")
                .add_condition("plugin::uninstalled.condition"),
            // Valid: untouched.
            stored(4, READ).with_subject("api::article.article"),
        ]);

        let report = clean_permissions_in_database(
            &store,
            &actions,
            &conditions,
            &ReconcileOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report, ReconcileReport { deleted: 2, updated: 1 });
        assert_eq!(*store.deleted.lock().unwrap(), vec![1, 2]);
        let updated = store.updated.lock().unwrap();
        assert_eq!(
            updated.get(&3).unwrap().conditions,
            vec!["admin::is-creator"]
        );
        assert!(!updated.contains_key(&4));
    }

    #[tokio::test]
    async fn reconciliation_pages_through_the_whole_table() {
        let (actions, conditions) = registries();
        let store = SnapshotStore::new(
            (1..=5)
                .map(|id| stored(id, "plugin::uninstalled.read"))
                .collect(),
        );
        let options = ReconcileOptions {
            page_size: 2,
            max_concurrent_updates: 2,
        };
        let report = clean_permissions_in_database(&store, &actions, &conditions, &options)
            .await
            .unwrap();
        assert_eq!(report.deleted, 5);
        assert_eq!(store.deleted.lock().unwrap().len(), 5);
    }

    #[test]
    fn list_payload_groups_actions_and_skips_internal_ones() {
        let (mut actions, conditions) = registries();
        // A sealed registry stays sealed; build a fresh one to add internals.
        let mut with_internal = ActionRegistry::new();
        for definition in [
            ActionDefinition::new("explorer.read", ActionSection::ContentTypes, "Read")
                .plugin("content-manager")
                .subjects(vec!["api::article.article"]),
            ActionDefinition::new("renew-token", ActionSection::Internal, "Renew token")
                .plugin("admin"),
        ] {
            with_internal.register(definition).unwrap();
        }
        std::mem::swap(&mut actions, &mut with_internal);

        let payload = permissions_list_payload(&actions, &conditions);
        let sections = &payload["data"]["sections"];
        assert_eq!(sections["contentTypes"].as_array().unwrap().len(), 1);
        assert_eq!(
            sections["contentTypes"][0]["actionId"],
            "plugin::content-manager.explorer.read"
        );
        // Internal action is not listed anywhere.
        assert!(!payload.to_string().contains("renew-token"));

        let listed = &payload["data"]["conditions"];
        assert_eq!(listed[0]["id"], "admin::is-creator");
        assert_eq!(listed[0]["displayName"], "Is creator");
        assert_eq!(listed[0]["category"], "default");
    }

    #[test]
    fn default_options_match_the_resource_model() {
        let options = ReconcileOptions::default();
        assert_eq!(options.page_size, 200);
        assert_eq!(options.max_concurrent_updates, 100);
    }
}
