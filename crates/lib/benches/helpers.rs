use jsondepot::{tree, value::Value};

/// Builds a document with `posts` list elements, each holding
/// `comments` comment elements, with ids assigned from 1.
///
/// Returns the tree and its watermark.
pub fn generate_document(posts: usize, comments: usize) -> (Value, u64) {
    let posts = (0..posts).map(|p| {
        let comments = (0..comments).map(|c| {
            Value::map([
                ("author", Value::from(format!("user_{c}"))),
                ("body", Value::from(format!("comment {c} on post {p}"))),
            ])
        });
        Value::map([
            ("title", Value::from(format!("post {p}"))),
            ("comments", Value::list(comments)),
        ])
    });
    let root = Value::map([("posts", Value::list(posts))]);

    let outcome = tree::replace_whole(1, root).expect("generated ids are unique");
    (outcome.data, outcome.watermark)
}

/// Id of the last post in a generated document.
pub fn last_post_id(posts: usize, comments: usize) -> u64 {
    ((posts - 1) * (comments + 1) + 1) as u64
}
