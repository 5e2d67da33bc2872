//! Path validation.
//!
//! A pathname is valid iff it begins with `/`, has more than one
//! character, and fits within `MAX_FILE_NAME`. Only a single segment after
//! the leading slash is meaningful — there is no hierarchy to walk.

use crate::dir::MAX_FILE_NAME;
use crate::error::{FsError, Result};

/// Validates `path` and returns the single path segment after the leading
/// `/`.
pub fn validate(path: &str) -> Result<&str> {
    if path.len() <= 1 || path.len() >= MAX_FILE_NAME || !path.starts_with('/') {
        return Err(FsError::InvalidPath(path.to_string()));
    }
    let name = &path[1..];
    if name.contains('/') {
        return Err(FsError::InvalidPath(path.to_string()));
    }
    Ok(name)
}
