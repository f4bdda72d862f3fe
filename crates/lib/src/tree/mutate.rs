//! Copy-on-write tree mutation.
//!
//! All mutators go through [`update_at`]: it walks the path one segment at a
//! time, hands the addressed node to a step function, and rebuilds each level
//! on the way back up. Only the containers on the root-to-target path are
//! copied; every sibling subtree is shared with the input.

use std::sync::Arc;

use crate::{
    constants::ID_KEY,
    path::Segment,
    value::{Value, kind_of},
};

use super::{TreeError, assign_ids, resolve::find_element};

/// Applies `step` to the node at `path` and returns the rebuilt root plus
/// whatever the step produced.
///
/// `step` receives the addressed node and, when that node is a direct member
/// of a list, the list's members.
pub fn update_at<T, F>(root: &Value, path: &[Segment], step: F) -> Result<(Value, T), TreeError>
where
    F: FnOnce(&Value, Option<&[Value]>) -> Result<(Value, T), TreeError>,
{
    descend(root, path, None, step)
}

fn descend<T, F>(
    node: &Value,
    path: &[Segment],
    siblings: Option<&[Value]>,
    step: F,
) -> Result<(Value, T), TreeError>
where
    F: FnOnce(&Value, Option<&[Value]>) -> Result<(Value, T), TreeError>,
{
    let Some((head, rest)) = path.split_first() else {
        return step(node, siblings);
    };
    match node {
        Value::List(items) => {
            let (index, element) =
                find_element(items, head.as_str()).ok_or_else(|| TreeError::ElementNotFound {
                    id: head.to_string(),
                })?;
            let (replacement, out) = descend(element, rest, Some(items.as_slice()), step)?;
            let mut copy = (**items).clone();
            copy[index] = replacement;
            Ok((Value::List(Arc::new(copy)), out))
        }
        Value::Map(entries) => {
            let child = entries
                .get(head.as_str())
                .ok_or_else(|| TreeError::KeyNotFound {
                    key: head.to_string(),
                })?;
            let (replacement, out) = descend(child, rest, None, step)?;
            let mut copy = (**entries).clone();
            copy.insert(head.to_string(), replacement);
            Ok((Value::Map(Arc::new(copy)), out))
        }
        other => Err(TreeError::PathTypeMismatch {
            segment: head.to_string(),
            kind: kind_of(other),
        }),
    }
}

/// Replaces the node at `path` with `value`. The empty path replaces the root.
pub fn set(root: &Value, path: &[Segment], value: Value) -> Result<Value, TreeError> {
    update_at(root, path, |_, _| Ok((value, ()))).map(|(new_root, ())| new_root)
}

/// Appends `element` to the list `root`, assigning ids from `seed` in the
/// context of that list.
///
/// Returns the new list, the element as stored, and the next seed.
pub fn append(root: &Value, element: &Value, seed: u64) -> Result<(Value, Value, u64), TreeError> {
    let Value::List(items) = root else {
        return Err(TreeError::NotAList {
            kind: kind_of(root),
        });
    };
    let (stored, next_seed) = assign_ids(element, seed, Some(items.as_slice()));
    let mut copy = Vec::with_capacity(items.len() + 1);
    copy.extend(items.iter().cloned());
    copy.push(stored.clone());
    Ok((Value::List(Arc::new(copy)), stored, next_seed))
}

/// Shallow merge of two maps: keys in `patch` overwrite keys in `current`.
///
/// Nested values are replaced wholesale. When `patch` carries no truthy
/// `id`, the id of `current` is kept; a truthy `id` in `patch` wins.
///
/// ```
/// # use jsondepot::{tree::merge, value::Value};
/// # use serde_json::json;
/// let current = Value::from(json!({"id": 7, "a": 1}));
/// let patch = Value::from(json!({"a": 2, "b": 3}));
/// let merged = merge(&current, &patch)?;
/// assert_eq!(serde_json::Value::from(merged), json!({"id": 7, "a": 2, "b": 3}));
/// # Ok::<(), jsondepot::tree::TreeError>(())
/// ```
pub fn merge(current: &Value, patch: &Value) -> Result<Value, TreeError> {
    let (Value::Map(base), Value::Map(changes)) = (current, patch) else {
        return Err(TreeError::MergeTypeError {
            current: kind_of(current),
            patch: kind_of(patch),
        });
    };
    let keep_id = current.element_id().is_some() && patch.element_id().is_none();
    let mut merged = (**base).clone();
    for (key, value) in changes.iter() {
        if keep_id && key == ID_KEY {
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    Ok(Value::Map(Arc::new(merged)))
}

/// Removes the node at `path` and returns the new root plus the removed
/// subtree.
///
/// # Errors
/// - [`TreeError::EmptyPath`] for the empty path
/// - [`TreeError::ElementNotFound`] / [`TreeError::KeyNotFound`] when the
///   target does not exist
/// - [`TreeError::UnsupportedDelete`] when the parent is a scalar
pub fn delete(root: &Value, path: &[Segment]) -> Result<(Value, Value), TreeError> {
    let (target, parent_path) = path.split_last().ok_or_else(|| TreeError::EmptyPath {
        operation: "delete".to_string(),
    })?;
    update_at(root, parent_path, |parent, _| match parent {
        Value::List(items) => {
            let (index, _) = find_element(items, target.as_str()).ok_or_else(|| {
                TreeError::ElementNotFound {
                    id: target.to_string(),
                }
            })?;
            let mut copy = (**items).clone();
            let removed = copy.remove(index);
            Ok((Value::List(Arc::new(copy)), removed))
        }
        Value::Map(entries) => {
            let mut copy = (**entries).clone();
            let removed =
                copy.shift_remove(target.as_str())
                    .ok_or_else(|| TreeError::KeyNotFound {
                        key: target.to_string(),
                    })?;
            Ok((Value::Map(Arc::new(copy)), removed))
        }
        other => Err(TreeError::UnsupportedDelete {
            kind: kind_of(other),
        }),
    })
}
