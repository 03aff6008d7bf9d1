//! Per-entity list, create, update and delete operations.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::components::data_table::{ListEndpoint, ListEnvelope, Page, PageParam, SearchMode};

use super::{ApiClient, ApiError, Endpoint};

/// A backend-owned record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Student,
    Teacher,
    Class,
    User,
    Payment,
    School,
}

impl Entity {
    /// Entities with a list screen.
    pub const LISTED: [Self; 5] = [
        Self::Student,
        Self::Teacher,
        Self::Class,
        Self::User,
        Self::Payment,
    ];

    /// Human label used in notices ("Student created").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher",
            Self::Class => "Class",
            Self::User => "User",
            Self::Payment => "Payment",
            Self::School => "School",
        }
    }

    /// List endpoint and its pagination/search conventions.
    #[must_use]
    pub fn list_endpoint(self) -> Option<ListEndpoint> {
        let (path, page_param, search) = match self {
            Self::Student => ("students", PageParam::OneBasedPage, "students"),
            Self::Teacher => ("teachers", PageParam::Offset, "teachers"),
            Self::Class => ("classes", PageParam::Offset, "classes"),
            Self::User => ("users", PageParam::Offset, "users"),
            Self::Payment => ("feepayments", PageParam::Offset, "payments"),
            Self::School => return None,
        };
        Some(ListEndpoint::new(
            Endpoint::new(path),
            page_param,
            SearchMode::SearchPath(search),
        ))
    }

    /// POST target for new records.
    #[must_use]
    pub const fn create_path(self) -> Option<&'static str> {
        match self {
            Self::Student => Some("students/post"),
            Self::Teacher => Some("teachers/post"),
            Self::Class => Some("classes/post"),
            Self::User => Some("users/post"),
            Self::Payment => Some("fee-payments/post"),
            Self::School => None,
        }
    }

    /// Prefix for PATCH by id.
    #[must_use]
    pub const fn update_prefix(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Class => "class",
            Self::User => "user",
            Self::Payment => "fee-payments",
            Self::School => "school/update",
        }
    }

    /// Prefix for DELETE by id.
    #[must_use]
    pub const fn delete_prefix(self) -> Option<&'static str> {
        match self {
            Self::Student => Some("student"),
            Self::Teacher => Some("teacher"),
            Self::Class => Some("class"),
            Self::User => Some("user"),
            Self::Payment => Some("fee-payments"),
            Self::School => None,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl ApiClient {
    /// Fetch one page of a list endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the envelope cannot be parsed.
    pub async fn list<T: DeserializeOwned>(&self, request: &Endpoint) -> Result<Page<T>, ApiError> {
        let envelope: ListEnvelope<T> = self.get(request).await?;
        Ok(envelope.into())
    }

    /// Create a record from a validated form body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the entity cannot be created or the request fails.
    #[instrument(skip(self, body))]
    pub async fn create_record(
        &self,
        entity: Entity,
        body: &Map<String, Value>,
    ) -> Result<Value, ApiError> {
        let path = entity
            .create_path()
            .ok_or_else(|| ApiError::Unsupported(format!("create {entity}")))?;
        self.post(&Endpoint::new(path), body).await
    }

    /// Partially update a record. Any `id` key in `body` is not sent.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self, body))]
    pub async fn update_record(
        &self,
        entity: Entity,
        id: i32,
        body: &Map<String, Value>,
    ) -> Result<Value, ApiError> {
        let mut body = body.clone();
        body.remove("id");
        let endpoint = Endpoint::new(entity.update_prefix()).segment(id);
        self.patch(&endpoint, &body).await
    }

    /// Delete a record by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the entity cannot be deleted or the request fails.
    #[instrument(skip(self))]
    pub async fn delete_record(&self, entity: Entity, id: i32) -> Result<(), ApiError> {
        let prefix = entity
            .delete_prefix()
            .ok_or_else(|| ApiError::Unsupported(format!("delete {entity}")))?;
        self.delete(&Endpoint::new(prefix).segment(id)).await
    }
}
