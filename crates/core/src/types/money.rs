//! Kenyan shilling amounts using decimal arithmetic.
//!
//! Fee amounts, balances and payments all travel through the API as JSON
//! numbers (or numeric strings, depending on the backend column type) and are
//! displayed as `KES 12,500.00`. Serialization writes the exact decimal as a
//! numeric string so no digits are lost.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An amount in Kenyan shillings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Kes(Decimal);

impl Kes {
    /// Zero shillings.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from whole shillings.
    #[must_use]
    pub fn from_shillings(shillings: i64) -> Self {
        Self(Decimal::from(shillings))
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Formats an optional amount, rendering a missing value as zero.
    #[must_use]
    pub fn display_or_zero(amount: Option<Self>) -> String {
        amount.unwrap_or(Self::ZERO).to_string()
    }
}

impl From<Decimal> for Kes {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl FromStr for Kes {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.trim().trim_start_matches("KES").trim().replace(',', "");
        Decimal::from_str(&cleaned).map(Self)
    }
}

impl fmt::Display for Kes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.abs().round_dp(2);
        let plain = format!("{rounded:.2}");
        let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        let sign = if self.is_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{sign}KES {grouped}.{fraction}")
    }
}

impl Serialize for Kes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.normalize().to_string())
    }
}

impl<'de> Deserialize<'de> for Kes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}
