use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{Error, ErrorKind, Result};

/// Identifies one unit of one book.
///
/// Both identifiers are non-empty ASCII alphanumeric strings. Book
/// identifiers are not always numeric (`0a` is the starter book), so they are
/// kept as strings. Every name used to locate a unit's resources is derived
/// from the key:
///
/// ```
/// use vela_cache::UnitKey;
///
/// let key = UnitKey::new("1", "3").unwrap();
/// assert_eq!(key.to_string(), "book1-unit3");
/// assert_eq!(key.resources_module(), "book1-unit3-resources");
/// assert_eq!(key.implementation_module(), "book1-unit3-implementation");
/// assert_eq!(key.legacy_export(), "book1Unit3Resources");
/// assert_eq!(key.getter_export(), "getBook1Unit3Resources");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey {
    book: String,
    unit: String,
}

impl UnitKey {
    pub fn new(book: impl Into<String>, unit: impl Into<String>) -> Result<Self> {
        let book = validate_id("book", book.into())?;
        let unit = validate_id("unit", unit.into())?;
        Ok(Self { book, unit })
    }

    pub fn book(&self) -> &str {
        &self.book
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Name of the module holding the unit's resource list.
    pub fn resources_module(&self) -> String {
        format!("{self}-resources")
    }

    /// Name of the module holding the unit's implementation getter.
    pub fn implementation_module(&self) -> String {
        format!("{self}-implementation")
    }

    /// Export name used by older resource modules.
    pub fn legacy_export(&self) -> String {
        format!("book{}Unit{}Resources", self.book, self.unit)
    }

    /// Getter exported by implementation modules.
    pub fn getter_export(&self) -> String {
        format!("getBook{}Unit{}Resources", self.book, self.unit)
    }
}

fn validate_id(field: &'static str, value: String) -> Result<String> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        exn::bail!(ErrorKind::InvalidKey(format!("{field} identifier {value:?}")));
    }
    Ok(value)
}

impl Display for UnitKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "book{}-unit{}", self.book, self.unit)
    }
}

impl FromStr for UnitKey {
    type Err = Error;

    /// Parses the cache-key form, `book{b}-unit{u}`.
    fn from_str(s: &str) -> Result<Self> {
        let parsed = s
            .strip_prefix("book")
            .and_then(|rest| rest.split_once('-'))
            .and_then(|(book, rest)| rest.strip_prefix("unit").map(|unit| (book, unit)));
        match parsed {
            Some((book, unit)) => Self::new(book, unit),
            None => exn::bail!(ErrorKind::InvalidKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for UnitKey {
    type Error = Error;
    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Serialize for UnitKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UnitKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|err: Error| de::Error::custom(&*err))
    }
}
