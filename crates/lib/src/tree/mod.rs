//! Path-addressed resolution and copy-on-write mutation of document trees.
//!
//! Everything in this module is synchronous and pure: functions take a
//! borrowed [`Value`](crate::value::Value), never modify it, and return a
//! new tree that shares every untouched subtree with the input. Persisting
//! results, credentials and concurrency control belong to [`crate::store`].
//!
//! # Addressing
//!
//! A path descends through maps by key and through lists by element id.
//! List members that are maps carry their id under the reserved `id` key;
//! [`assign_ids`] fills in missing ids from the document watermark.
//!
//! ```
//! use jsondepot::{path::PathBuf, tree, value::Value};
//! use serde_json::json;
//!
//! let data = Value::from(json!({"arr": [{"id": 1, "name": "a"}]}));
//! let outcome = tree::append_child(&data, &PathBuf::normalize("arr"), 2, Value::from(json!({"name": "b"})))?;
//! assert_eq!(outcome.watermark, 3);
//!
//! let stored = tree::resolve(&outcome.data, &PathBuf::normalize("arr/2/name"))?;
//! assert_eq!(stored, &Value::from("b"));
//! # Ok::<(), jsondepot::tree::TreeError>(())
//! ```

mod errors;
mod ids;
mod mutate;
mod ops;
mod resolve;

pub use errors::TreeError;
pub use ids::{assign_ids, ensure_unique_ids};
pub use mutate::{append, delete, merge, set, update_at};
pub use ops::{Outcome, append_child, delete_at, merge_at, replace_whole, set_at};
pub use resolve::{find_element, resolve, resolve_parent};
