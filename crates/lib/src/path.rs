//! Path types for addressing values inside a document.
//!
//! A path is an ordered sequence of [`Segment`]s. Each segment descends one
//! level: through a map by key, or through a list by element id. Raw paths
//! arrive as slash-separated text (`posts/3/title`) and are normalized before
//! they reach [`crate::tree`].
//!
//! # Usage
//!
//! ```rust
//! use jsondepot::path::PathBuf;
//!
//! // Parse from text (empty segments are dropped)
//! let path = PathBuf::normalize("/posts//3/title/");
//! assert_eq!(path.to_string(), "posts/3/title");
//!
//! // Build incrementally
//! let path = PathBuf::new().push("posts").push("3");
//! assert_eq!(path.len(), 2);
//! ```

use std::{convert::Infallible, fmt, ops::Deref, str::FromStr};

use thiserror::Error;

use crate::constants::PATH_SEPARATOR;

/// Error type for path validation failures.
///
/// Parsing through [`PathBuf::normalize`] never fails; this error is only
/// produced when building a [`Segment`] directly.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The segment is empty or contains a separator.
    #[error("Invalid path segment '{segment}': {reason}")]
    InvalidSegment { segment: String, reason: String },
}

impl PathError {
    /// Check if this error is about a malformed segment.
    pub fn is_invalid_segment(&self) -> bool {
        matches!(self, PathError::InvalidSegment { .. })
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}

/// A single validated step of a path: non-empty and free of `/`.
///
/// # Examples
///
/// ```rust
/// # use jsondepot::path::Segment;
/// assert!(Segment::new("posts").is_ok());
/// assert!(Segment::new("").is_err());
/// assert!(Segment::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment(String);

impl Segment {
    /// Creates a segment, rejecting empty text and text containing `/`.
    pub fn new(s: impl Into<String>) -> Result<Self, PathError> {
        let s = s.into();
        if s.is_empty() {
            return Err(PathError::InvalidSegment {
                segment: s,
                reason: "segments cannot be empty".to_string(),
            });
        }
        if s.contains(PATH_SEPARATOR) {
            return Err(PathError::InvalidSegment {
                segment: s,
                reason: "segments cannot contain '/'".to_string(),
            });
        }
        Ok(Segment(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Segment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Segment {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Segment::new(s)
    }
}

impl TryFrom<&str> for Segment {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Segment::new(s)
    }
}

impl TryFrom<String> for Segment {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Segment::new(s)
    }
}

/// An owned, normalized path.
///
/// Dereferences to `[Segment]`, which is what the tree engine consumes.
/// The empty path addresses the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathBuf {
    segments: Vec<Segment>,
}

impl PathBuf {
    /// Creates the empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw slash-separated path, dropping empty segments.
    ///
    /// ```rust
    /// # use jsondepot::path::PathBuf;
    /// assert!(PathBuf::normalize("").is_empty());
    /// assert!(PathBuf::normalize("///").is_empty());
    /// assert_eq!(PathBuf::normalize("a//b/").to_string(), "a/b");
    /// ```
    pub fn normalize(raw: &str) -> Self {
        let segments = raw
            .split(PATH_SEPARATOR)
            .filter(|part| !part.is_empty())
            .map(|part| Segment(part.to_string()))
            .collect();
        Self { segments }
    }

    /// Builds a path from already separated segments, validating each one.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = segments
            .into_iter()
            .map(Segment::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Appends raw path text to the end of this path, normalizing it.
    pub fn push(mut self, raw: impl AsRef<str>) -> Self {
        self.segments.extend(Self::normalize(raw.as_ref()).segments);
        self
    }

    /// The path without its final segment. Empty for the root and for
    /// single-segment paths.
    pub fn parent(&self) -> &[Segment] {
        match self.segments.split_last() {
            Some((_, parent)) => parent,
            None => &[],
        }
    }

    /// Iterates the segments as string slices.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(Segment::as_str)
    }
}

impl Deref for PathBuf {
    type Target = [Segment];

    fn deref(&self) -> &Self::Target {
        &self.segments
    }
}

impl AsRef<[Segment]> for PathBuf {
    fn as_ref(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for PathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for PathBuf {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PathBuf::normalize(s))
    }
}

impl From<&str> for PathBuf {
    fn from(s: &str) -> Self {
        PathBuf::normalize(s)
    }
}

impl From<Vec<Segment>> for PathBuf {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl FromIterator<Segment> for PathBuf {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

/// Renders a segment slice as slash-separated text, for messages and logs.
pub fn display(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(Segment::as_str)
        .collect::<Vec<_>>()
        .join("/")
}
