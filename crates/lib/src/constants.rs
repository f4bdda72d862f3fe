//! Constants used throughout the jsondepot library.
//!
//! This module provides central definitions for reserved keys and the
//! defaults of the document envelope.

/// Reserved key holding the element id of a map stored inside a list.
pub const ID_KEY: &str = "id";

/// Watermark of a freshly created document, before its initial id pass.
pub const INITIAL_WATERMARK: u64 = 1;

/// Number of random bytes in a document credential (hex encoded on the wire).
pub const CREDENTIAL_BYTES: usize = 32;

/// Default number of read-compute-write attempts before a write gives up.
pub const DEFAULT_MAX_WRITE_RETRIES: u32 = 8;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';
