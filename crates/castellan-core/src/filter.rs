//! Filter expressions and condition results
//!
//! A condition handler answers with an explicit sum type rather than a
//! duck-typed boolean-or-object: `Allow` contributes nothing, `Deny` vetoes
//! the whole permission, and `Filter` contributes a partial query filter
//! that is merged into the rule's `$and`/`$or` condition tree.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A composable query filter contributed by a condition handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpression {
    /// A leaf clause, e.g. `{"created_by": {"$eq": 12}}`
    Clause(Map<String, Value>),
    /// Conjunction of sub-expressions
    And(Vec<FilterExpression>),
    /// Disjunction of sub-expressions
    Or(Vec<FilterExpression>),
}

impl FilterExpression {
    /// Build a leaf clause from a JSON object
    pub fn clause(fields: Map<String, Value>) -> Self {
        Self::Clause(fields)
    }

    /// Build a single-field leaf clause
    pub fn field(path: impl Into<String>, value: Value) -> Self {
        let mut fields = Map::new();
        fields.insert(path.into(), value);
        Self::Clause(fields)
    }

    /// Conjunction of the given expressions
    pub fn and(parts: Vec<FilterExpression>) -> Self {
        Self::And(parts)
    }

    /// Disjunction of the given expressions
    pub fn or(parts: Vec<FilterExpression>) -> Self {
        Self::Or(parts)
    }

    /// Whether the expression matches everything (no constraints at all)
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Clause(fields) => fields.is_empty(),
            Self::And(parts) | Self::Or(parts) => parts.iter().all(Self::is_empty),
        }
    }

    /// Render to the `$and`/`$or` JSON shape consumed by the query layer
    pub fn to_value(&self) -> Value {
        match self {
            Self::Clause(fields) => Value::Object(fields.clone()),
            Self::And(parts) => {
                json!({ "$and": parts.iter().map(Self::to_value).collect::<Vec<_>>() })
            }
            Self::Or(parts) => {
                json!({ "$or": parts.iter().map(Self::to_value).collect::<Vec<_>>() })
            }
        }
    }
}

/// Outcome of evaluating one condition against a principal
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionResult {
    /// The condition holds unconditionally; contributes no filter
    Allow,
    /// The condition vetoes the permission for this principal
    Deny,
    /// The condition holds only for entities matching the filter
    Filter(FilterExpression),
}

impl ConditionResult {
    /// Convenience constructor mapping a plain boolean verdict
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Self::Allow
        } else {
            Self::Deny
        }
    }

    /// Whether this result vetoes the permission
    pub fn is_deny(&self) -> bool {
        matches!(self, Self::Deny)
    }
}
