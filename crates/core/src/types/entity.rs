//! Entity records as returned by the backend API.
//!
//! Field names follow the backend's JSON, which mixes `snake_case`
//! (`first_name`, `payment_mode`) with `camelCase` (`guardianName`, `classId`).
//! Write-only fields such as a user's password are never part of these
//! records; forms build their own request bodies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::choice::{Gender, PaymentMode, Role};
use super::id::{ClassId, PaymentId, SchoolId, StudentId, TeacherId, UserId};
use super::money::Kes;

/// An enrolled student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, with = "date_only")]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(rename = "guardianName", default)]
    pub guardian_name: Option<String>,
    #[serde(rename = "guardianPhone", default)]
    pub guardian_phone: Option<String>,
    #[serde(rename = "classId", default)]
    pub class_id: Option<ClassId>,
    /// Class joined in by list endpoints.
    #[serde(rename = "Class", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassSummary>,
    #[serde(rename = "feeAmount", default)]
    pub fee_amount: Option<Kes>,
    /// Outstanding fees after all recorded payments.
    #[serde(rename = "feeBalance", default)]
    pub fee_balance: Option<Kes>,
}

impl Student {
    /// First and last name separated by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Name of the joined class, if the endpoint included it.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.class.as_ref().map(|class| class.name.as_str())
    }
}

/// The `Class` object nested inside student rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSummary {
    #[serde(default)]
    pub id: Option<ClassId>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Teacher {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A class (grade) and its class teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    #[serde(rename = "teacherId", default)]
    pub teacher_id: Option<TeacherId>,
}

/// A recorded fee payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    #[serde(rename = "studentId")]
    pub student_id: StudentId,
    #[serde(rename = "classId", default)]
    pub class_id: Option<ClassId>,
    pub amount: Kes,
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub reference: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A dashboard login account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Whether the account may sign in.
    #[serde(rename = "activeStatus", default)]
    pub active_status: bool,
}

/// The singleton school settings record used on invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    #[serde(default)]
    pub id: Option<SchoolId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub phone2: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(rename = "mpesaInfo", default)]
    pub mpesa_info: Option<String>,
    #[serde(rename = "bankName", default)]
    pub bank_name: Option<String>,
    #[serde(rename = "bankAcc", default)]
    pub bank_acc: Option<String>,
    #[serde(default)]
    pub school_motto: Option<String>,
}

/// Dates of birth arrive either as `YYYY-MM-DD` or as a full ISO timestamp.
mod date_only {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    #[allow(clippy::ref_option)] // signature required by `#[serde(with)]`
    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let day = raw.get(..10).unwrap_or(raw.as_str());
        NaiveDate::parse_from_str(day, FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
