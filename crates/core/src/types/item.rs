//! Order item label.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing an [`ItemLabel`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemLabelError {
    /// The input is empty or only whitespace.
    #[error("item cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("item must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The label of the item an order is placed for. Never empty.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ItemLabel(String);

impl ItemLabel {
    /// Maximum length of an item label.
    pub const MAX_LENGTH: usize = 200;

    /// Parse an `ItemLabel`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than 200
    /// characters.
    pub fn parse(s: &str) -> Result<Self, ItemLabelError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ItemLabelError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(ItemLabelError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ItemLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
