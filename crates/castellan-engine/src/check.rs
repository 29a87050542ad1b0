//! The interactive permission check
//!
//! Powers the admin UI's "check permissions" endpoint: the UI sends a batch
//! of `{action, subject?, field?}` probes and gets back a boolean per probe,
//! in input order, to decide which controls to render. Malformed entries
//! fail the whole request with a validation error — never partial results.

use castellan_core::{EngineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ability::Ability;

/// One `{action, subject?, field?}` probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionCheck {
    /// Action id to probe
    pub action: String,
    /// Optional subject uid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Optional field path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl PermissionCheck {
    /// Probe an action with no subject or field
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject: None,
            field: None,
        }
    }

    /// Scope the probe to a subject
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Scope the probe to a field
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Parse and validate a `POST /permissions/check` body.
///
/// Expects `{"permissions": [{action, subject?, field?}, …]}`. Unknown
/// keys, missing actions and non-string values all reject the whole
/// payload.
pub fn parse_check_payload(body: &Value) -> Result<Vec<PermissionCheck>> {
    let entries = body
        .get("permissions")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::validation("permissions is a required array"))?;

    entries
        .iter()
        .map(|entry| {
            let check: PermissionCheck = serde_json::from_value(entry.clone())
                .map_err(|err| EngineError::validation(format!("invalid permission check: {err}")))?;
            if check.action.is_empty() {
                return Err(EngineError::validation("action is a required field"));
            }
            Ok(check)
        })
        .collect()
}

/// Answer each probe against the ability, in input order
pub fn check_many(ability: &Ability, checks: &[PermissionCheck]) -> Vec<bool> {
    checks
        .iter()
        .map(|check| {
            ability.can(
                &check.action,
                check.subject.as_deref(),
                check.field.as_deref(),
            )
        })
        .collect()
}

/// Curried form of [`check_many`], bound to one ability
pub fn check_many_with(ability: &Ability) -> impl Fn(&[PermissionCheck]) -> Vec<bool> + '_ {
    move |checks| check_many(ability, checks)
}
