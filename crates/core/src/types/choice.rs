//! Enumerated field values shared by forms, tables and invoices.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string that did not match any allowed value for an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {value}")]
pub struct ChoiceError {
    /// Field being parsed (e.g. "payment mode").
    pub field: &'static str,
    /// Rejected input.
    pub value: String,
}

/// How a fee payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// M-Pesa mobile money.
    Mpesa,
    Cash,
    Bank,
    Cheque,
}

impl PaymentMode {
    /// All modes in the order they are offered in the payment form.
    pub const ALL: [Self; 4] = [Self::Mpesa, Self::Cash, Self::Bank, Self::Cheque];

    /// Wire value as sent to the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mpesa => "MPESA",
            Self::Cash => "CASH",
            Self::Bank => "BANK",
            Self::Cheque => "CHEQUE",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ChoiceError {
                field: "payment mode",
                value: s.to_owned(),
            })
    }
}

/// Dashboard user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access, including user management and maintenance actions.
    Admin,
    /// Day-to-day clerical access.
    User,
}

impl Role {
    pub const ALL: [Self; 2] = [Self::Admin, Self::User];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            _ => Err(ChoiceError {
                field: "role",
                value: s.to_owned(),
            }),
        }
    }
}

/// Student gender as recorded on admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            _ => Err(ChoiceError {
                field: "gender",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_mode_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMode::Mpesa).unwrap(),
            "\"MPESA\""
        );
        let parsed: PaymentMode = serde_json::from_str("\"CHEQUE\"").unwrap();
        assert_eq!(parsed, PaymentMode::Cheque);
    }

    #[test]
    fn test_payment_mode_from_str_is_case_insensitive() {
        assert_eq!("mpesa".parse::<PaymentMode>().unwrap(), PaymentMode::Mpesa);
        let err = "PAYPAL".parse::<PaymentMode>().unwrap_err();
        assert_eq!(err.to_string(), "invalid payment mode: PAYPAL");
    }

    #[test]
    fn test_role_round_trip_through_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_gender_rejects_unknown() {
        assert!("OTHER".parse::<Gender>().is_err());
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
    }
}
