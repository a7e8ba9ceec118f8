//! Identifier types shared by the session layer and the gateways

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity used when no durable copy exists
pub const FALLBACK_USER_ID: &str = "1";

/// Active user identifier
///
/// Opaque token, never empty. The remote service keys users by integer, so
/// [`UserId::wire_value`] sends numeric identifiers as JSON numbers and
/// everything else as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier, trimming surrounding whitespace
    ///
    /// Returns `Error::InvalidInput` if nothing is left after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput(
                "user id must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The fallback identity (`1`)
    pub fn fallback() -> Self {
        Self(FALLBACK_USER_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, if the identifier is an integer
    pub fn as_number(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// JSON representation used in request bodies
    pub fn wire_value(&self) -> serde_json::Value {
        match self.as_number() {
            Some(n) => serde_json::Value::from(n),
            None => serde_json::Value::from(self.0.clone()),
        }
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::fallback()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<i64> for UserId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Accept both `42` and `"42"`
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(UserId::from(n)),
            Raw::Text(s) => UserId::new(s).map_err(serde::de::Error::custom),
        }
    }
}

/// Catalog item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(ItemId)
            .map_err(|e| Error::InvalidInput(format!("invalid item id '{}': {}", s, e)))
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        Self(n)
    }
}
