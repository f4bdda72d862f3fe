//! Element id allocation and validation.
//!
//! Maps that sit directly inside a list are addressed by their `id` field.
//! [`assign_ids`] gives every such map without a truthy id the next free
//! integer from the document watermark; [`ensure_unique_ids`] checks that no
//! list ends up with two members sharing an id.

use std::{collections::HashMap, sync::Arc};

use serde_json::Number;
use tracing::trace;

use crate::{
    constants::ID_KEY,
    path::Segment,
    value::{Value, ids_equal},
};

use super::{TreeError, resolve::find_element};

/// Assigns ids in depth-first pre-order and returns the new tree together
/// with the next free integer.
///
/// When `containing_list` is given, `root` is treated as a member of that
/// list: a map root receives an id too, one that no member of the list
/// already uses.
///
/// Ids of `0`, `""`, `false` and `null` count as absent and are replaced.
/// Nodes that gain no id are shared with the input.
///
/// ```
/// # use jsondepot::{tree::assign_ids, value::Value};
/// let list = Value::from(serde_json::json!([{}, {}, {"id": "custom"}, {}]));
/// let (with_ids, next) = assign_ids(&list, 5, None);
/// assert_eq!(next, 8);
/// assert_eq!(
///     serde_json::Value::from(with_ids),
///     serde_json::json!([{"id": 5}, {"id": 6}, {"id": "custom"}, {"id": 7}])
/// );
/// ```
pub fn assign_ids(root: &Value, seed: u64, containing_list: Option<&[Value]>) -> (Value, u64) {
    let mut allocator = Allocator { next: seed };
    let rebuilt = allocator.visit(root, containing_list);
    (rebuilt.unwrap_or_else(|| root.clone()), allocator.next)
}

struct Allocator {
    next: u64,
}

impl Allocator {
    /// Takes the next integer that no member of `siblings` uses as its id.
    fn take(&mut self, siblings: &[Value]) -> u64 {
        loop {
            let id = self.next;
            self.next += 1;
            let candidate = Value::Number(Number::from(id));
            let used = siblings
                .iter()
                .filter_map(Value::id)
                .any(|existing| ids_equal(existing, &candidate));
            if used {
                trace!(id, "skipping element id used by a sibling");
                continue;
            }
            trace!(id, "allocated element id");
            return id;
        }
    }

    /// Returns `Some` only when the node or one of its descendants changed.
    fn visit(&mut self, node: &Value, siblings: Option<&[Value]>) -> Option<Value> {
        match node {
            Value::Map(entries) => {
                let mut rebuilt = None;
                if let Some(siblings) = siblings.filter(|_| node.element_id().is_none()) {
                    let id = self.take(siblings);
                    let mut copy = (**entries).clone();
                    copy.insert(ID_KEY.to_string(), Value::from(id));
                    rebuilt = Some(copy);
                }
                for (key, value) in entries.iter() {
                    if let Some(changed) = self.visit(value, None) {
                        rebuilt
                            .get_or_insert_with(|| (**entries).clone())
                            .insert(key.clone(), changed);
                    }
                }
                rebuilt.map(|copy| Value::Map(Arc::new(copy)))
            }
            Value::List(items) => {
                let mut rebuilt: Option<Vec<Value>> = None;
                for (index, item) in items.iter().enumerate() {
                    if let Some(changed) = self.visit(item, Some(items.as_slice())) {
                        rebuilt.get_or_insert_with(|| (**items).clone())[index] = changed;
                    }
                }
                rebuilt.map(|copy| Value::List(Arc::new(copy)))
            }
            _ => None,
        }
    }
}

/// Verifies that no list in the tree has two map members with equal ids.
///
/// # Errors
/// [`TreeError::DuplicateElementId`] naming the first repeated id.
pub fn ensure_unique_ids(root: &Value) -> Result<(), TreeError> {
    match root {
        Value::List(items) => {
            check_siblings(items)?;
            items.iter().try_for_each(ensure_unique_ids)
        }
        Value::Map(entries) => entries.values().try_for_each(ensure_unique_ids),
        _ => Ok(()),
    }
}

/// Checks only what a path write rebuilt: every list on the way from the
/// root of `after` to the target, and the whole `stored` subtree.
///
/// `before` is the tree the write started from. Rebuilt lists keep their
/// members' positions, so positions found in `before` lead through `after`
/// even when the write changed the target's id.
pub(crate) fn ensure_unique_along(
    before: &Value,
    after: &Value,
    path: &[Segment],
    stored: &Value,
) -> Result<(), TreeError> {
    let (mut before, mut after) = (before, after);
    for segment in path {
        let next = match (before, after) {
            (Value::List(old), Value::List(new)) => {
                check_siblings(new)?;
                find_element(old, segment.as_str())
                    .and_then(|(index, element)| Some((element, new.get(index)?)))
            }
            (Value::Map(old), Value::Map(new)) => old
                .get(segment.as_str())
                .zip(new.get(segment.as_str())),
            _ => None,
        };
        let Some((old_child, new_child)) = next else {
            break;
        };
        before = old_child;
        after = new_child;
    }
    if let Value::List(items) = after {
        check_siblings(items)?;
    }
    ensure_unique_ids(stored)
}

/// Ids that compare equal under [`ids_equal`] always land in the same bucket.
#[derive(PartialEq, Eq, Hash)]
enum Bucket<'a> {
    Numeric(u64),
    Text(&'a str),
    Other,
}

fn bucket(id: &Value) -> Bucket<'_> {
    let numeric = match id {
        Value::Number(n) => n.as_f64(),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match (numeric, id) {
        // adding 0.0 folds -0.0 into 0.0
        (Some(n), _) => Bucket::Numeric((n + 0.0).to_bits()),
        (None, Value::Text(s)) => Bucket::Text(s),
        _ => Bucket::Other,
    }
}

fn check_siblings(items: &[Value]) -> Result<(), TreeError> {
    let mut seen: HashMap<Bucket<'_>, Vec<&Value>> = HashMap::new();
    for id in items.iter().filter_map(Value::element_id) {
        let peers = seen.entry(bucket(id)).or_default();
        if peers.iter().any(|other| ids_equal(other, id)) {
            return Err(TreeError::DuplicateElementId { id: id_label(id) });
        }
        peers.push(id);
    }
    Ok(())
}

/// Renders an id the way it would appear as a path segment.
pub(crate) fn id_label(id: &Value) -> String {
    match id {
        Value::Text(s) => s.clone(),
        other => serde_json::Value::from(other).to_string(),
    }
}
