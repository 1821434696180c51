//! Bucket key validation.
//!
//! Keys are always `/`-separated regardless of platform, so this works on
//! string segments rather than [`std::path::Component`]s.

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a bucket key.
/// Ensures that keys don't escape the bucket root (no `..` traversal).
///
/// A leading `/` is accepted and dropped, empty and `.` segments collapse,
/// and `..` pops the previous segment. Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized key if valid, or [`InvalidKey`](crate::error::ErrorKind::InvalidKey)
/// if invalid.
///
/// # Examples
///
/// ```
/// use vela_storage::validate_key;
/// // Valid keys
/// assert!(validate_key("book1/unit1/01 A.jpg").is_ok());
/// assert!(validate_key("/leading/slash.png").is_ok());
/// // Invalid keys
/// assert!(validate_key("../secret").is_err());
/// assert!(validate_key("a\0b").is_err());
/// // Keys get resolved
/// assert_eq!(validate_key("wrong/../book1//./cover.png/").unwrap(), "book1/cover.png");
/// ```
pub fn validate(key: impl AsRef<str>) -> Result<String> {
    let key = key.as_ref();
    if key.contains('\0') {
        exn::bail!(ErrorKind::InvalidKey(key.replace('\0', "\\0")));
    }
    let mut segments: Vec<&str> = Vec::new();
    for segment in key.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                if segments.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidKey(key.to_string()));
                }
            },
            normal => segments.push(normal),
        }
    }
    match segments.is_empty() {
        true => exn::bail!(ErrorKind::InvalidKey(key.to_string())),
        false => Ok(segments.join("/")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert_eq!(validate("book1/unit1/cover.png").unwrap(), "book1/unit1/cover.png");
        assert_eq!(validate("simple.pdf").unwrap(), "simple.pdf");
        assert_eq!(validate("book1/01 R What is it – a pen.jpg").unwrap(), "book1/01 R What is it – a pen.jpg");
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(validate("a//b//c").unwrap(), "a/b/c");
        assert_eq!(validate("a/./b/./c").unwrap(), "a/b/c");
        assert_eq!(validate("/a/b").unwrap(), "a/b");
        assert_eq!(validate("a/b/c/").unwrap(), "a/b/c");
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(validate("../etc/passwd").is_err());
        assert!(validate("a/../../b").is_err());
        assert!(validate("..").is_err());
        // Traversal remains within bucket root
        assert_eq!(validate("a/b/..").unwrap(), "a");
    }

    #[test]
    fn test_invalid_characters() {
        assert!(validate("a\0b").is_err());
        assert!(validate("\0").is_err());
    }

    #[test]
    fn test_empty_keys() {
        assert!(validate("").is_err());
        assert!(validate(".").is_err());
        assert!(validate("./").is_err());
        assert!(validate("//").is_err());
    }
}
