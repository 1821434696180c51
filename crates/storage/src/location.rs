//! Bucket URL construction.

use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_key;
use exn::{OptionExt, ResultExt};
use reqwest::Url;

/// Public bucket holding the curriculum media.
pub const DEFAULT_BASE_URL: &str = "https://visualenglishmaterial.s3.eu-north-1.amazonaws.com";

/// Where assets live: a base URL plus an optional key prefix acting as a
/// virtual directory.
///
/// Keys are validated with [`validate_key`](crate::validate_key) and
/// percent-encoded segment by segment, so filenames containing spaces,
/// dashes or `#` produce well-formed URLs.
///
/// # Examples
///
/// ```
/// use vela_storage::S3Location;
///
/// let location = S3Location::new("https://bucket.example", Some("media".to_string())).unwrap();
/// assert_eq!(
///     location.url_for("/book1/01 A.jpg").unwrap(),
///     "https://bucket.example/media/book1/01%20A.jpg"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    base_url: Url,
    prefix: Option<String>,
}

impl S3Location {
    /// Create a location from an absolute http(s) base URL.
    pub fn new(base_url: impl AsRef<str>, prefix: Option<String>) -> Result<Self> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw).or_raise(|| ErrorKind::InvalidUrl(raw.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            exn::bail!(ErrorKind::InvalidUrl(raw.to_string()));
        }
        let prefix = prefix.map(validate_key).transpose()?;
        Ok(Self { base_url, prefix })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Full URL for a bucket key. A leading `/` on `key` is ignored.
    pub fn url_for(&self, key: impl AsRef<str>) -> Result<String> {
        let key = validate_key(key)?;
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .ok()
                .ok_or_raise(|| ErrorKind::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            if let Some(prefix) = &self.prefix {
                segments.extend(prefix.split('/'));
            }
            segments.extend(key.split('/'));
        }
        Ok(url.into())
    }
}

impl Default for S3Location {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default bucket URL is valid"),
            prefix: None,
        }
    }
}
