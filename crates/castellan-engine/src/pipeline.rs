//! The per-permission evaluation pipeline
//!
//! An ordered list of named stages, each of which either keeps the
//! (possibly reshaped) permission or drops it. Any stage may drop without
//! throwing: a stored permission referencing a since-removed action or
//! property must never crash authorization for the principal's other rules.

use castellan_domain::Permission;
use castellan_registry::ActionRegistry;
use tracing::debug;

pub(crate) enum StageOutcome {
    Keep(Permission),
    Drop { reason: &'static str },
}

type Stage = fn(&ActionRegistry, Permission) -> StageOutcome;

const STAGES: &[(&str, Stage)] = &[
    ("validate", validate_action),
    ("format", format_properties),
    ("post-validate", reject_empty_fields),
];

/// Run a stored permission through every stage in order.
///
/// Returns `None` when any stage drops it; the drop is logged at debug
/// level and is never an error.
pub(crate) fn run_pipeline(actions: &ActionRegistry, permission: Permission) -> Option<Permission> {
    let action = permission.action.clone();
    let mut current = permission;
    for (name, stage) in STAGES {
        match stage(actions, current) {
            StageOutcome::Keep(next) => current = next,
            StageOutcome::Drop { reason } => {
                debug!(action = %action, stage = name, reason, "dropping stored permission");
                return None;
            }
        }
    }
    Some(current)
}

/// Drop permissions whose action is unknown to the registry
fn validate_action(actions: &ActionRegistry, permission: Permission) -> StageOutcome {
    if actions.has(&permission.action) {
        StageOutcome::Keep(permission)
    } else {
        StageOutcome::Drop {
            reason: "unknown action",
        }
    }
}

/// Strip properties the action does not declare in `apply_to_properties`
fn format_properties(actions: &ActionRegistry, mut permission: Permission) -> StageOutcome {
    let Some(action) = actions.get(&permission.action) else {
        return StageOutcome::Drop {
            reason: "unknown action",
        };
    };
    let properties = std::mem::take(&mut permission.properties);
    permission.properties = properties
        .into_iter()
        .filter(|(name, _)| action.applies_to_property(name))
        .collect();
    StageOutcome::Keep(permission)
}

/// Drop permissions whose `fields` property resolved to an empty array.
///
/// An explicit "no fields" grant is equivalent to no grant at all; letting
/// it through would silently become "all fields" downstream.
fn reject_empty_fields(_actions: &ActionRegistry, permission: Permission) -> StageOutcome {
    match permission.fields() {
        Some(fields) if fields.is_empty() => StageOutcome::Drop {
            reason: "explicit empty fields grant",
        },
        _ => StageOutcome::Keep(permission),
    }
}
