//! Create and update modals.
//!
//! A [`FormModal`] holds raw text inputs for one entity. Submitting validates
//! them against the entity's [`Schema`]; invalid input never reaches the
//! network. A successful save clears and closes the modal, drops the
//! reference lists the mutation touched, and tells the parent list to
//! refetch. A failed save keeps the modal open with its values intact.

pub mod payment;
pub mod schema;
pub mod schemas;

pub use payment::PaymentForm;
pub use schema::{FieldKind, FieldRule, FormValues, PHONE_RE, Schema, ValidationErrors};
pub use schemas::{FormMode, login_schema, schema_for};

use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiClient, ApiError, Entity};
use crate::cache::ReferenceCache;
use crate::components::Notice;

/// Notice shown after a successful save.
pub const SAVE_SUCCESS: &str = "Data Updated Success.";

/// Notice shown after a failed save.
pub const SAVE_FAILED: &str = "Data update failed.";

/// Result of submitting a modal.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Input rejected client-side; nothing was sent.
    Invalid(ValidationErrors),
    /// Backend accepted the change.
    Saved { notice: Notice, response: Value },
    /// Backend call failed.
    Failed { notice: Notice, error: ApiError },
}

impl SubmitOutcome {
    /// Whether the parent list should refetch.
    #[must_use]
    pub const fn needs_refetch(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        match self {
            Self::Invalid(_) => None,
            Self::Saved { notice, .. } | Self::Failed { notice, .. } => Some(notice),
        }
    }
}

/// Modal form state for one entity.
#[derive(Debug, Clone)]
pub struct FormModal {
    entity: Entity,
    mode: FormMode,
    schema: Schema,
    open: bool,
    values: FormValues,
    errors: ValidationErrors,
    notice: Option<Notice>,
}

impl FormModal {
    /// A closed, empty modal.
    #[must_use]
    pub fn new(entity: Entity, mode: FormMode) -> Self {
        Self {
            entity,
            mode,
            schema: schema_for(entity, mode),
            open: false,
            values: FormValues::new(),
            errors: ValidationErrors::default(),
            notice: None,
        }
    }

    /// A closed create modal.
    #[must_use]
    pub fn create(entity: Entity) -> Self {
        Self::new(entity, FormMode::Create)
    }

    /// A closed update modal pre-filled from an existing record.
    ///
    /// Scalar JSON fields become text inputs; nested objects and nulls are
    /// skipped. The `id` field is never part of the input.
    #[must_use]
    pub fn update<R: Serialize>(entity: Entity, id: i32, record: &R) -> Self {
        let mut modal = Self::new(entity, FormMode::Update(id));
        if let Ok(Value::Object(fields)) = serde_json::to_value(record) {
            for (key, value) in fields {
                if key == "id" {
                    continue;
                }
                let text = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => continue,
                };
                modal.values.insert(key, text);
            }
        }
        modal
    }

    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    #[must_use]
    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    pub const fn open(&mut self) {
        self.open = true;
    }

    /// Close without saving. Values are kept for the next open.
    pub fn close(&mut self) {
        self.open = false;
        self.errors = ValidationErrors::default();
    }

    /// Set one input. Clears that field's error.
    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
        self.errors = self.errors_without(field);
    }

    /// Clear one input.
    pub fn unset(&mut self, field: &str) {
        self.values.remove(field);
    }

    #[must_use]
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    #[must_use]
    pub const fn values(&self) -> &FormValues {
        &self.values
    }

    #[must_use]
    pub const fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// The notice left by the last submit, if any.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Validate only. Updates the per-field errors.
    ///
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&mut self) -> Result<serde_json::Map<String, Value>, ValidationErrors> {
        let result = self.schema.validate(&self.values);
        self.errors = result.as_ref().err().cloned().unwrap_or_default();
        result
    }

    /// Validate and send.
    pub async fn submit(&mut self, client: &ApiClient, cache: &ReferenceCache) -> SubmitOutcome {
        let body = match self.validate() {
            Ok(body) => body,
            Err(errors) => {
                tracing::debug!(entity = %self.entity, fields = errors.len(), "Form rejected");
                return SubmitOutcome::Invalid(errors);
            }
        };

        let result = match self.mode {
            FormMode::Create => client.create_record(self.entity, &body).await,
            FormMode::Update(id) => client.update_record(self.entity, id, &body).await,
        };

        match result {
            Ok(response) => {
                cache.invalidate_after_mutation(self.entity).await;
                self.values.clear();
                self.open = false;
                let notice = Notice::success(SAVE_SUCCESS);
                self.notice = Some(notice.clone());
                SubmitOutcome::Saved { notice, response }
            }
            Err(error) => {
                tracing::error!(entity = %self.entity, error = %error, "Failed to save record");
                let notice = Notice::error(SAVE_FAILED);
                self.notice = Some(notice.clone());
                SubmitOutcome::Failed { notice, error }
            }
        }
    }

    fn errors_without(&self, field: &str) -> ValidationErrors {
        let mut remaining = ValidationErrors::default();
        for (name, message) in self.errors.iter().filter(|(name, _)| *name != field) {
            remaining.insert(name, message);
        }
        remaining
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use schoolsoft_core::{Teacher, TeacherId};
    use url::Url;

    use super::*;

    fn unreachable_client() -> ApiClient {
        ApiClient::new(
            Url::parse("http://127.0.0.1:9/api/").unwrap(),
            Duration::from_millis(200),
        )
        .unwrap()
    }

    #[test]
    fn test_update_prefills_scalars_without_id() {
        let teacher = Teacher {
            id: TeacherId::new(5),
            first_name: "Peter".to_string(),
            last_name: "Kamau".to_string(),
            phone: None,
        };
        let modal = FormModal::update(Entity::Teacher, 5, &teacher);
        assert_eq!(modal.mode(), FormMode::Update(5));
        assert_eq!(modal.value("first_name"), Some("Peter"));
        assert!(modal.value("id").is_none());
        assert!(modal.value("phone").is_none());
    }

    #[test]
    fn test_set_clears_field_error() {
        let mut modal = FormModal::create(Entity::Class);
        modal.set("name", "A");
        assert!(modal.validate().is_err());
        assert!(modal.errors().get("name").is_some());

        modal.set("name", "Grade 4");
        assert!(modal.errors().get("name").is_none());
        let body = modal.validate().unwrap();
        assert_eq!(body["name"], "Grade 4");
    }

    #[tokio::test]
    async fn test_invalid_submit_keeps_modal_open() {
        let client = unreachable_client();
        let cache = ReferenceCache::new(client.clone());
        let mut modal = FormModal::create(Entity::Teacher);
        modal.open();
        modal.set("first_name", "P");

        let outcome = modal.submit(&client, &cache).await;
        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        assert!(!outcome.needs_refetch());
        assert!(modal.is_open());
        assert_eq!(modal.value("first_name"), Some("P"));
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_values() {
        let client = unreachable_client();
        let cache = ReferenceCache::new(client.clone());
        let mut modal = FormModal::create(Entity::Class);
        modal.open();
        modal.set("name", "Grade 4");

        let outcome = modal.submit(&client, &cache).await;
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert!(outcome.notice().unwrap().is_error());
        assert!(modal.is_open());
        assert_eq!(modal.value("name"), Some("Grade 4"));
        assert_eq!(modal.notice().unwrap().message, SAVE_FAILED);
    }
}
