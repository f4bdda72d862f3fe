use jsondepot::path::{PathBuf, Segment};

#[test]
fn test_normalize_and_display() {
    let path: PathBuf = "/posts/3//comments/".parse().unwrap();
    assert_eq!(path.components().collect::<Vec<_>>(), ["posts", "3", "comments"]);
    assert_eq!(path.to_string(), "posts/3/comments");
    assert_eq!(PathBuf::from(path.parent().to_vec()).to_string(), "posts/3");
}

#[test]
fn test_segment_validation() {
    assert!(Segment::new("a/b").unwrap_err().is_invalid_segment());
    assert!(PathBuf::from_segments(["posts", ""]).is_err());

    let err: jsondepot::Error = Segment::new("").unwrap_err().into();
    assert_eq!(err.module(), "path");
    assert!(err.is_validation_error());
}
