//! Ability generation
//!
//! Loads the principal's stored permissions, runs each through the
//! evaluation pipeline, evaluates its conditions against the principal and
//! registers the survivors as authorization rules.

use std::sync::Arc;

use castellan_core::{ConditionResult, FilterExpression, Principal, Result};
use castellan_domain::Permission;
use castellan_registry::{ActionRegistry, ConditionRegistry};
use tracing::debug;

use crate::ability::{Ability, AbilityRule, ALL_SUBJECT};
use crate::pipeline::run_pipeline;
use crate::provider::PermissionsProvider;

enum ConditionEvaluation {
    /// At least one condition answered `Deny`
    Vetoed,
    /// Granted, with the merged filter when any condition contributed one
    Granted(Option<FilterExpression>),
}

/// Builds abilities from stored permissions and the live registries
pub struct AbilityEngine {
    actions: Arc<ActionRegistry>,
    conditions: Arc<ConditionRegistry>,
    provider: Arc<dyn PermissionsProvider>,
}

impl AbilityEngine {
    /// Create an engine over sealed registries and a permission lookup
    pub fn new(
        actions: Arc<ActionRegistry>,
        conditions: Arc<ConditionRegistry>,
        provider: Arc<dyn PermissionsProvider>,
    ) -> Self {
        Self {
            actions,
            conditions,
            provider,
        }
    }

    /// The action registry the engine validates against
    pub fn actions(&self) -> &Arc<ActionRegistry> {
        &self.actions
    }

    /// The condition registry the engine evaluates against
    pub fn conditions(&self) -> &Arc<ConditionRegistry> {
        &self.conditions
    }

    /// Generate the ability for a principal.
    ///
    /// Super admins bypass the engine entirely. Data drift (unknown
    /// actions, stale properties or condition ids, empty-fields grants) is
    /// silently dropped; a failing condition handler is the only error
    /// path.
    pub async fn generate_user_ability(&self, principal: &Principal) -> Result<Ability> {
        if principal.is_super_admin() {
            return Ok(Ability::grant_all());
        }

        let permissions = self.provider.find_user_permissions(principal).await?;
        let mut rules = Vec::new();
        for permission in permissions {
            let Some(permission) = run_pipeline(&self.actions, permission) else {
                continue;
            };
            match self.evaluate_conditions(&permission, principal).await? {
                ConditionEvaluation::Vetoed => continue,
                ConditionEvaluation::Granted(filter) => {
                    rules.push(Self::register(permission, filter));
                }
            }
        }
        Ok(Ability::new(rules))
    }

    fn register(permission: Permission, filter: Option<FilterExpression>) -> AbilityRule {
        let fields = permission.fields();
        AbilityRule {
            subject: permission
                .subject
                .unwrap_or_else(|| ALL_SUBJECT.to_string()),
            action: permission.action,
            fields,
            condition: filter.map(|expr| expr.to_value()),
        }
    }

    /// Evaluate every condition attached to a permission.
    ///
    /// Unregistered ids are skipped. `Deny` vetoes the permission. Each
    /// `Filter` result becomes an OR-branch; a non-empty set of branches
    /// merges into `{"$and": [{"$or": [...]}]}`. Handler errors propagate.
    async fn evaluate_conditions(
        &self,
        permission: &Permission,
        principal: &Principal,
    ) -> Result<ConditionEvaluation> {
        let mut branches = Vec::new();
        for id in &permission.conditions {
            let Some(condition) = self.conditions.get(id) else {
                debug!(
                    condition = %id,
                    action = %permission.action,
                    "skipping unregistered condition"
                );
                continue;
            };
            match condition.evaluate(principal).await? {
                ConditionResult::Deny => return Ok(ConditionEvaluation::Vetoed),
                ConditionResult::Allow => {}
                ConditionResult::Filter(expr) => branches.push(expr),
            }
        }
        if branches.is_empty() {
            Ok(ConditionEvaluation::Granted(None))
        } else {
            Ok(ConditionEvaluation::Granted(Some(FilterExpression::and(
                vec![FilterExpression::or(branches)],
            ))))
        }
    }
}
