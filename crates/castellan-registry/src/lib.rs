//! # Castellan Registry
//!
//! Boot-time catalogues of the operations the system understands (actions)
//! and the named predicates permissions may attach (conditions). Both
//! registries are write-once-at-boot: all registration happens during the
//! host's bootstrap phase, then `seal()` closes the window and the registry
//! becomes safe for lock-free concurrent reads behind an `Arc`.

pub mod action;
pub mod action_registry;
pub mod condition;
pub mod condition_registry;

pub use action::{compute_action_id, Action, ActionDefinition, ActionOptions, ActionSection};
pub use action_registry::ActionRegistry;
pub use condition::{Condition, ConditionDefinition, ConditionHandler, FnCondition};
pub use condition_registry::ConditionRegistry;
