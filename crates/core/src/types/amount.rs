//! Non-negative monetary amount using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when constructing an [`Amount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The value is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The text is not a decimal number.
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// A non-negative order amount in the shop's currency.
///
/// Backed by [`Decimal`] so `49.99` stays `49.99`. Serializes as a string
/// (`"49.99"`) like the rest of the workspace's decimal values.
///
/// ```
/// use orderdesk_core::Amount;
///
/// let amount = Amount::parse("49.99").unwrap();
/// assert_eq!(amount.to_string(), "49.99");
/// assert!(Amount::parse("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Negative` if the value is below zero.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_zero() {
            return Ok(Self::ZERO);
        }
        if value.is_sign_negative() {
            return Err(AmountError::Negative);
        }
        Ok(Self(value))
    }

    /// Parse an amount from decimal text.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Invalid` for non-numeric text and
    /// `AmountError::Negative` for values below zero.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let value: Decimal = s
            .trim()
            .parse()
            .map_err(|e: rust_decimal::Error| AmountError::Invalid(e.to_string()))?;
        Self::new(value)
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_precision() {
        let amount = Amount::parse("49.99").unwrap();
        assert_eq!(amount.as_decimal(), Decimal::new(4999, 2));
    }

    #[test]
    fn test_zero_is_allowed() {
        assert_eq!(Amount::new(Decimal::ZERO).unwrap(), Amount::ZERO);
        assert_eq!(Amount::parse("-0").unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_negative_is_rejected() {
        assert_eq!(Amount::new(Decimal::new(-1, 2)), Err(AmountError::Negative));
        assert_eq!(Amount::parse("-10"), Err(AmountError::Negative));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            Amount::parse("ten dollars"),
            Err(AmountError::Invalid(_))
        ));
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Amount>("\"-5.00\"").is_err());
        let amount: Amount = serde_json::from_str("\"100\"").unwrap();
        assert_eq!(amount.to_string(), "100");
    }
}
