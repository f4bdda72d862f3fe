//! Read-only path resolution.

use crate::{
    path::Segment,
    value::{Value, id_matches_segment},
};

use super::TreeError;

/// Walks `path` from `root` and returns the addressed value.
///
/// Lists are searched by element id (first match wins), maps by exact key.
/// The empty path resolves to `root` itself.
///
/// # Errors
/// - [`TreeError::ElementNotFound`] when no list member has the segment as id
/// - [`TreeError::KeyNotFound`] when a map lacks the key
/// - [`TreeError::PathTypeMismatch`] when the path continues past a scalar
pub fn resolve<'a>(root: &'a Value, path: &[Segment]) -> Result<&'a Value, TreeError> {
    path.iter().try_fold(root, child)
}

/// Resolves all but the last segment and returns the parent together with
/// the final segment.
///
/// # Errors
/// [`TreeError::EmptyPath`] for the empty path, otherwise the failures of
/// [`resolve`].
pub fn resolve_parent<'a, 'p>(
    root: &'a Value,
    path: &'p [Segment],
) -> Result<(&'a Value, &'p Segment), TreeError> {
    let (last, parent_path) = path.split_last().ok_or_else(|| TreeError::EmptyPath {
        operation: "resolve_parent".to_string(),
    })?;
    Ok((resolve(root, parent_path)?, last))
}

/// Descends a single segment.
pub(crate) fn child<'a>(node: &'a Value, segment: &Segment) -> Result<&'a Value, TreeError> {
    match node {
        Value::List(items) => find_element(items, segment.as_str())
            .map(|(_, element)| element)
            .ok_or_else(|| TreeError::ElementNotFound {
                id: segment.to_string(),
            }),
        Value::Map(entries) => {
            entries
                .get(segment.as_str())
                .ok_or_else(|| TreeError::KeyNotFound {
                    key: segment.to_string(),
                })
        }
        other => Err(TreeError::PathTypeMismatch {
            segment: segment.to_string(),
            kind: other.kind(),
        }),
    }
}

/// Finds the first direct member of `items` whose `id` matches `segment`,
/// returning its position and the member. Falsy ids never match.
pub fn find_element<'a>(items: &'a [Value], segment: &str) -> Option<(usize, &'a Value)> {
    items.iter().enumerate().find(|(_, element)| {
        element
            .element_id()
            .is_some_and(|id| id_matches_segment(id, segment))
    })
}
