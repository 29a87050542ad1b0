//! Dot-path access into JSON trees
//!
//! Used by the permission domain for nested `properties` access and by the
//! sanitizer when pruning query clauses. Paths are dot-separated object
//! keys; array indexing is deliberately unsupported.

use serde_json::{Map, Value};

/// Read the value at `path`, if the whole chain of keys exists
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Non-object nodes along the way are replaced by objects.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    set_segments(root, &segments, value);
}

fn set_segments(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Some(map) = node.as_object_mut() else {
        return;
    };
    if rest.is_empty() {
        map.insert((*head).to_string(), value);
        return;
    }
    let child = map
        .entry((*head).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    set_segments(child, rest, value);
}

/// Remove the value at `path`. Returns whether anything was removed.
pub fn delete_path(root: &mut Value, path: &str) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    delete_segments(root, &segments)
}

fn delete_segments(node: &mut Value, segments: &[&str]) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        return false;
    };
    let Some(map) = node.as_object_mut() else {
        return false;
    };
    if rest.is_empty() {
        return map.remove(*head).is_some();
    }
    match map.get_mut(*head) {
        Some(child) => delete_segments(child, rest),
        None => false,
    }
}
