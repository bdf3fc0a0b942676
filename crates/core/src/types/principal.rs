//! Verified identity principal.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`Principal`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PrincipalError {
    /// The input is empty or only whitespace.
    #[error("principal cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("principal must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The verified identity a customer is known by.
///
/// Usually the email address returned by the identity provider. A principal
/// is the customer's natural key, so it is always stored in normalized form:
/// surrounding whitespace is trimmed and the text is case-folded. Two inputs
/// that differ only in case parse to equal principals.
///
/// ## Constraints
///
/// - Length: 1-254 characters after trimming (RFC 5321 limit for emails)
///
/// ## Examples
///
/// ```
/// use orderdesk_core::Principal;
///
/// let principal = Principal::parse("  Test@Example.com ").unwrap();
/// assert_eq!(principal.as_str(), "test@example.com");
/// assert_eq!(principal, Principal::parse("TEST@example.COM").unwrap());
///
/// assert!(Principal::parse("").is_err());
/// assert!(Principal::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Maximum length of a principal.
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize a `Principal`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or its case-folded
    /// form is longer than 254 characters.
    pub fn parse(s: &str) -> Result<Self, PrincipalError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PrincipalError::Empty);
        }

        // Folding can grow a string (`İ` becomes two chars), so measure after.
        let folded = trimmed.to_lowercase();
        if folded.chars().count() > Self::MAX_LENGTH {
            return Err(PrincipalError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(folded))
    }

    /// Returns the principal as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Principal` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Deserialization goes through `parse` so stored or transmitted values are
// always normalized.
impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let principal = Principal::parse("  Test@Example.com\n").unwrap();
        assert_eq!(principal.as_str(), "test@example.com");
    }

    #[test]
    fn test_case_variants_are_equal() {
        assert_eq!(
            Principal::parse("Test@Example.com").unwrap(),
            Principal::parse("tEST@eXAMPLE.COM").unwrap()
        );
    }

    #[test]
    fn test_non_email_principals_are_accepted() {
        assert_eq!(Principal::parse("Test").unwrap().as_str(), "test");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Principal::parse(""), Err(PrincipalError::Empty));
        assert_eq!(Principal::parse(" \t "), Err(PrincipalError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Principal::parse(&long),
            Err(PrincipalError::TooLong { .. })
        ));
    }

    #[test]
    fn test_length_is_measured_after_case_folding() {
        // `İ` lowercases to `i` plus a combining dot.
        let at_limit = Principal::parse(&"\u{130}".repeat(127)).unwrap();
        assert_eq!(at_limit.as_str().chars().count(), Principal::MAX_LENGTH);
        assert_eq!(Principal::parse(at_limit.as_str()).unwrap(), at_limit);

        assert!(matches!(
            Principal::parse(&"\u{130}".repeat(128)),
            Err(PrincipalError::TooLong { .. })
        ));
    }

    #[test]
    fn test_deserialize_normalizes() {
        let principal: Principal = serde_json::from_str("\"User@Example.com\"").unwrap();
        assert_eq!(principal.as_str(), "user@example.com");
        assert!(serde_json::from_str::<Principal>("\"  \"").is_err());
    }
}
