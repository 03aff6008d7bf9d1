//! Reference lists, counts and chart aggregates.
//!
//! Reference lists come back wrapped in a single-key object
//! (`{"student": [...]}`, `{"grade": [...]}`); a missing or `null` key is
//! treated as an empty list. The school settings record is returned bare.

use rust_decimal::Decimal;
use schoolsoft_core::{Class, ClassId, School, Student, Teacher};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::{ApiClient, ApiError, Endpoint};

/// One slice of an aggregate (`{name, value}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    #[serde(default)]
    pub value: Decimal,
}

impl ApiClient {
    /// All students (`students/all`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be parsed.
    pub async fn students_all(&self) -> Result<Vec<Student>, ApiError> {
        self.reference_list("students/all", "student").await
    }

    /// All classes (`classes/all`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be parsed.
    pub async fn classes_all(&self) -> Result<Vec<Class>, ApiError> {
        self.reference_list("classes/all", "grade").await
    }

    /// All teachers (`teachers/all`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be parsed.
    pub async fn teachers_all(&self) -> Result<Vec<Teacher>, ApiError> {
        self.reference_list("teachers/all", "teacher").await
    }

    /// The school settings record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be parsed.
    pub async fn school(&self) -> Result<School, ApiError> {
        let school: Option<School> = self.get(&Endpoint::new("schools/all")).await?;
        Ok(school.unwrap_or_default())
    }

    /// Total number of students.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn student_count(&self) -> Result<u64, ApiError> {
        self.count("students/count", "totalStudents").await
    }

    /// Total number of teachers.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn teacher_count(&self) -> Result<u64, ApiError> {
        self.count("teachers/count", "totalTeachers").await
    }

    /// Total number of classes.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn class_count(&self) -> Result<u64, ApiError> {
        self.count("classes/count", "totalClasses").await
    }

    /// Today's revenue grouped by payment mode.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be parsed.
    #[instrument(skip(self))]
    pub async fn payment_modes_today(&self) -> Result<Vec<NamedValue>, ApiError> {
        self.reference_list("payments/get/paymentmodes", "todayRevenueByPaymentMode")
            .await
    }

    /// Paid/unpaid breakdown for one class.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body cannot be parsed.
    #[instrument(skip(self))]
    pub async fn fee_status(&self, class_id: ClassId) -> Result<Vec<NamedValue>, ApiError> {
        let endpoint = Endpoint::new("students/fee-status").segment(class_id);
        let slices: Option<Vec<NamedValue>> = self.get(&endpoint).await?;
        Ok(slices.unwrap_or_default())
    }

    async fn reference_list<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
    ) -> Result<Vec<T>, ApiError> {
        let mut body: Value = self.get(&Endpoint::new(path)).await?;
        match body.get_mut(key).map(Value::take) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(list) => serde_json::from_value(list)
                .map_err(|e| ApiError::Parse(format!("Failed to parse {key} list: {e}"))),
        }
    }

    async fn count(&self, path: &str, key: &str) -> Result<u64, ApiError> {
        let body: Value = self.get(&Endpoint::new(path)).await?;
        Ok(count_field(&body, key))
    }
}

/// Read a count that may arrive as a number or a numeric string.
fn count_field(body: &Value, key: &str) -> u64 {
    match body.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_count_field_shapes() {
        assert_eq!(count_field(&json!({"totalStudents": 42}), "totalStudents"), 42);
        assert_eq!(count_field(&json!({"totalStudents": "7"}), "totalStudents"), 7);
        assert_eq!(count_field(&json!({}), "totalStudents"), 0);
        assert_eq!(count_field(&json!(null), "totalStudents"), 0);
    }

    #[test]
    fn test_named_value_accepts_numbers_and_strings() {
        let slices: Vec<NamedValue> =
            serde_json::from_value(json!([{"name": "MPESA", "value": 1500}, {"name": "CASH", "value": "250.50"}]))
                .unwrap();
        assert_eq!(slices[0].value, Decimal::from(1500));
        assert_eq!(slices[1].value, Decimal::new(25050, 2));
    }
}
