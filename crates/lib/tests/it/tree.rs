//! End-to-end behaviour of the tree operations on realistic documents.

use std::sync::Arc;

use jsondepot::{
    tree::{self, TreeError},
    value::{Kind, Value},
};
use serde_json::json;

use crate::helpers::{j, p, v};

fn blog() -> (Value, u64) {
    let outcome = tree::replace_whole(
        1,
        v(json!({
            "title": "my blog",
            "posts": [
                {"title": "first", "comments": [{"body": "nice"}, {"body": "meh"}]},
                {"title": "second", "comments": []}
            ],
            "tags": ["rust", "json"]
        })),
    )
    .unwrap();
    (outcome.data, outcome.watermark)
}

#[test]
fn test_initial_ids_follow_pre_order() {
    let (data, watermark) = blog();
    assert_eq!(
        j(&data),
        json!({
            "title": "my blog",
            "posts": [
                {"id": 1, "title": "first", "comments": [{"id": 2, "body": "nice"}, {"id": 3, "body": "meh"}]},
                {"id": 4, "title": "second", "comments": []}
            ],
            "tags": ["rust", "json"]
        })
    );
    assert_eq!(watermark, 5);
}

#[test]
fn test_resolve_by_key_and_loose_id() {
    let (data, _) = blog();
    let body = tree::resolve(&data, &p("posts/1/comments/3/body")).unwrap();
    assert_eq!(body, &Value::from("meh"));

    let post = tree::resolve(&data, &p("/posts//4/")).unwrap();
    assert_eq!(post.get("title"), Some(&Value::from("second")));

    let err = tree::resolve(&data, &p("posts/9")).unwrap_err();
    assert_eq!(err, TreeError::ElementNotFound { id: "9".into() });
    assert_eq!(err.to_string(), "Unfound array element by id: \"9\"");

    let err = tree::resolve(&data, &p("author")).unwrap_err();
    assert_eq!(err, TreeError::KeyNotFound { key: "author".into() });

    let err = tree::resolve(&data, &p("title/x")).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_editing_session() {
    let (data, watermark) = blog();

    // Comment on the second post.
    let outcome = tree::append_child(
        &data,
        &p("posts/4/comments"),
        watermark,
        v(json!({"body": "first!", "replies": [{"body": "lol"}]})),
    )
    .unwrap();
    assert_eq!(
        j(&outcome.stored),
        json!({"id": 5, "body": "first!", "replies": [{"id": 6, "body": "lol"}]})
    );
    assert_eq!(outcome.watermark, 7);

    // Retitle it, keeping its id.
    let outcome = tree::set_at(
        &outcome.data,
        &p("posts/4"),
        outcome.watermark,
        v(json!({"title": "second, edited", "comments": []})),
    )
    .unwrap();
    assert_eq!(outcome.stored.get("id"), Some(&Value::from(4)));
    assert_eq!(outcome.watermark, 7);

    // Patch the first post.
    let outcome = tree::merge_at(
        &outcome.data,
        &p("posts/1"),
        outcome.watermark,
        v(json!({"draft": false, "title": "first!"})),
    )
    .unwrap();
    assert_eq!(outcome.stored.get("id"), Some(&Value::from(1)));
    assert_eq!(outcome.stored.get("draft"), Some(&Value::from(false)));
    assert_eq!(
        outcome.stored.get("comments").map(Value::kind),
        Some(Kind::List)
    );

    // Drop a comment and a top-level key.
    let (data, removed) = tree::delete_at(&outcome.data, &p("posts/1/comments/2")).unwrap();
    assert_eq!(j(&removed), json!({"id": 2, "body": "nice"}));
    let (data, removed) = tree::delete_at(&data, &p("tags")).unwrap();
    assert_eq!(j(&removed), json!(["rust", "json"]));

    assert_eq!(
        j(&data),
        json!({
            "title": "my blog",
            "posts": [
                {"id": 1, "title": "first!", "comments": [{"id": 3, "body": "meh"}], "draft": false},
                {"id": 4, "title": "second, edited", "comments": []}
            ]
        })
    );
}

#[test]
fn test_watermark_never_reuses_deleted_ids() {
    let (data, watermark) = blog();
    let (data, _) = tree::delete_at(&data, &p("posts/4")).unwrap();

    let outcome = tree::append_child(&data, &p("posts"), watermark, v(json!({}))).unwrap();
    assert_eq!(outcome.stored.get("id"), Some(&Value::from(5)));
    assert_eq!(outcome.watermark, 6);
}

#[test]
fn test_caller_ids_are_kept_and_skipped() {
    let (data, watermark) = blog();
    let outcome =
        tree::append_child(&data, &p("posts"), watermark, v(json!({"id": "intro"}))).unwrap();
    assert_eq!(outcome.watermark, watermark);

    let post = tree::resolve(&outcome.data, &p("posts/intro")).unwrap();
    assert_eq!(post, &outcome.stored);

    let err = tree::append_child(&outcome.data, &p("posts"), watermark, v(json!({"id": "4"})))
        .unwrap_err();
    assert!(err.is_duplicate_id());
}

#[test]
fn test_off_path_subtrees_are_shared() {
    let (data, watermark) = blog();
    let outcome = tree::set_at(&data, &p("posts/1/title"), watermark, Value::from("X")).unwrap();

    let before = data.get("posts").and_then(Value::as_list).unwrap();
    let after = outcome.data.get("posts").and_then(Value::as_list).unwrap();
    assert!(!Arc::ptr_eq(before, after));

    let (Value::Map(old_second), Value::Map(new_second)) = (&before[1], &after[1]) else {
        panic!("posts should hold maps");
    };
    assert!(Arc::ptr_eq(old_second, new_second));

    let (Value::List(old_tags), Some(Value::List(new_tags))) =
        (data.get("tags").unwrap(), outcome.data.get("tags"))
    else {
        panic!("tags should be a list");
    };
    assert!(Arc::ptr_eq(old_tags, new_tags));
}

#[test]
fn test_errors_leave_document_untouched() {
    let (data, watermark) = blog();
    let snapshot = data.clone();

    assert!(tree::append_child(&data, &p("title"), watermark, v(json!({}))).is_err());
    assert!(tree::merge_at(&data, &p("tags"), watermark, v(json!({"a": 1}))).is_err());
    assert!(tree::set_at(&data, &p("posts/1/missing"), watermark, Value::from(1)).is_err());
    assert!(tree::delete_at(&data, &p("title/x")).is_err());
    assert!(tree::delete_at(&data, &p("")).unwrap_err().is_validation_error());

    assert_eq!(data, snapshot);
}
