//! Conditions: named predicates over the acting principal
//!
//! A condition handler sees the principal only — no subject or action
//! context — and answers with a [`ConditionResult`]. Handlers may be
//! asynchronous (they are free to consult other principal attributes), so
//! the trait is async; plain closures are adapted through [`FnCondition`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use castellan_core::{ConditionResult, Principal, Result};

use crate::action::compute_action_id;

/// A predicate over the acting principal
#[async_trait]
pub trait ConditionHandler: Send + Sync {
    /// Evaluate the condition for the given principal.
    ///
    /// Errors propagate to the caller and fail the whole ability
    /// generation: a failing handler is a programming error, not data drift.
    async fn evaluate(&self, principal: &Principal) -> Result<ConditionResult>;
}

/// Adapter turning a plain synchronous closure into a [`ConditionHandler`]
pub struct FnCondition<F>(pub F);

#[async_trait]
impl<F> ConditionHandler for FnCondition<F>
where
    F: Fn(&Principal) -> ConditionResult + Send + Sync,
{
    async fn evaluate(&self, principal: &Principal) -> Result<ConditionResult> {
        Ok((self.0)(principal))
    }
}

/// Registration input for a condition
pub struct ConditionDefinition {
    /// Local name, unique within the owning plugin
    pub name: String,
    /// Owning plugin, if any
    pub plugin: Option<String>,
    /// Human-readable name shown in the admin UI
    pub display_name: String,
    /// UI grouping; defaults to `"default"`
    pub category: Option<String>,
    /// The predicate itself
    pub handler: Arc<dyn ConditionHandler>,
}

impl ConditionDefinition {
    /// Define a condition with an arbitrary handler
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        handler: impl ConditionHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            plugin: None,
            display_name: display_name.into(),
            category: None,
            handler: Arc::new(handler),
        }
    }

    /// Define a condition from a plain closure
    pub fn from_fn(
        name: impl Into<String>,
        display_name: impl Into<String>,
        predicate: impl Fn(&Principal) -> ConditionResult + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, display_name, FnCondition(predicate))
    }

    /// Set the owning plugin
    pub fn plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Set the UI category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub(crate) fn into_condition(self) -> Condition {
        // Conditions share the action id namespace scheme.
        let id = compute_action_id(self.plugin.as_deref(), &self.name);
        Condition {
            id,
            display_name: self.display_name,
            category: self.category.unwrap_or_else(|| "default".to_string()),
            plugin: self.plugin,
            handler: self.handler,
        }
    }
}

/// A registered condition
#[derive(Clone)]
pub struct Condition {
    /// Unique key in the registry, derived from `(plugin, name)`
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// UI grouping
    pub category: String,
    /// Owning plugin, if any
    pub plugin: Option<String>,
    handler: Arc<dyn ConditionHandler>,
}

impl Condition {
    /// Evaluate the condition's handler for the given principal
    pub async fn evaluate(&self, principal: &Principal) -> Result<ConditionResult> {
        self.handler.evaluate(principal).await
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("category", &self.category)
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castellan_core::FilterExpression;
    use serde_json::json;

    #[tokio::test]
    async fn closure_conditions_answer_with_the_sum_type() {
        let condition = ConditionDefinition::from_fn("is-bob", "Is Bob", |principal| {
            ConditionResult::from_bool(principal.id() == 42)
        })
        .into_condition();

        assert_eq!(condition.id, "api::is-bob");
        let bob = Principal::admin_user(42, "bob@example.com", vec![]);
        let eve = Principal::admin_user(7, "eve@example.com", vec![]);
        assert_eq!(condition.evaluate(&bob).await.unwrap(), ConditionResult::Allow);
        assert!(condition.evaluate(&eve).await.unwrap().is_deny());
    }

    #[tokio::test]
    async fn handlers_may_contribute_filters() {
        let condition = ConditionDefinition::from_fn("is-creator", "Is creator", |principal| {
            ConditionResult::Filter(FilterExpression::field(
                "created_by",
                json!({ "$eq": principal.id() }),
            ))
        })
        .plugin("admin")
        .category("default")
        .into_condition();

        assert_eq!(condition.id, "admin::is-creator");
        let user = Principal::admin_user(9, "carol@example.com", vec![]);
        match condition.evaluate(&user).await.unwrap() {
            ConditionResult::Filter(expr) => {
                assert_eq!(expr.to_value(), json!({ "created_by": { "$eq": 9 } }));
            }
            other => panic!("expected a filter, got {other:?}"),
        }
    }
}
