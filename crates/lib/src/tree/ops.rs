//! Document-level entry points.
//!
//! These combine the mutators with id allocation and validation. They take
//! the current document tree and watermark and return the replacement pair;
//! persisting it is the caller's job.

use std::sync::Arc;

use crate::{constants::ID_KEY, path::Segment, value::Value};

use super::{TreeError, assign_ids, ensure_unique_ids, ids::ensure_unique_along, mutate};

/// Result of a write against a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The new document tree.
    pub data: Value,
    /// The new watermark.
    pub watermark: u64,
    /// The value as stored at the target, for echoing back to the caller.
    pub stored: Value,
}

/// Replaces the whole document, assigning ids across the new tree starting
/// at `seed`.
pub fn replace_whole(seed: u64, new_value: Value) -> Result<Outcome, TreeError> {
    let (data, watermark) = assign_ids(&new_value, seed, None);
    ensure_unique_ids(&data)?;
    Ok(Outcome {
        stored: data.clone(),
        data,
        watermark,
    })
}

/// Appends `element` to the list at `path`. The empty path appends to the
/// root.
pub fn append_child(
    data: &Value,
    path: &[Segment],
    seed: u64,
    element: Value,
) -> Result<Outcome, TreeError> {
    let (updated, (stored, watermark)) = mutate::update_at(data, path, |target, _| {
        let (list, stored, next) = mutate::append(target, &element, seed)?;
        Ok((list, (stored, next)))
    })?;
    ensure_unique_along(data, &updated, path, &stored)?;
    Ok(Outcome {
        data: updated,
        watermark,
        stored,
    })
}

/// Removes the value at `path`, returning the new tree and the removed value.
/// Deleting the whole document is not a tree operation.
pub fn delete_at(data: &Value, path: &[Segment]) -> Result<(Value, Value), TreeError> {
    if path.is_empty() {
        return Err(TreeError::EmptyPath {
            operation: "delete_at".to_string(),
        });
    }
    mutate::delete(data, path)
}

/// Overwrites the existing value at `path`.
///
/// A map written without a truthy `id` over a map that has one keeps the
/// existing id, so the element stays addressable under the same path.
pub fn set_at(
    data: &Value,
    path: &[Segment],
    seed: u64,
    value: Value,
) -> Result<Outcome, TreeError> {
    if path.is_empty() {
        return replace_whole(seed, value);
    }
    let (updated, (stored, watermark)) = mutate::update_at(data, path, |current, siblings| {
        let value = carry_id(current, value);
        let (stored, next) = assign_ids(&value, seed, siblings);
        Ok((stored.clone(), (stored, next)))
    })?;
    ensure_unique_along(data, &updated, path, &stored)?;
    Ok(Outcome {
        data: updated,
        watermark,
        stored,
    })
}

/// Shallow-merges `patch` into the map at `path`.
pub fn merge_at(
    data: &Value,
    path: &[Segment],
    seed: u64,
    patch: Value,
) -> Result<Outcome, TreeError> {
    let (updated, (stored, watermark)) = mutate::update_at(data, path, |current, siblings| {
        let merged = mutate::merge(current, &patch)?;
        let (stored, next) = assign_ids(&merged, seed, siblings);
        Ok((stored.clone(), (stored, next)))
    })?;
    ensure_unique_along(data, &updated, path, &stored)?;
    Ok(Outcome {
        data: updated,
        watermark,
        stored,
    })
}

fn carry_id(current: &Value, value: Value) -> Value {
    let carried = match (&value, current.element_id()) {
        (Value::Map(entries), Some(id)) if value.element_id().is_none() => {
            let mut copy = (**entries).clone();
            copy.insert(ID_KEY.to_string(), id.clone());
            Some(Value::Map(Arc::new(copy)))
        }
        _ => None,
    };
    carried.unwrap_or(value)
}
