//! List screens: one table plus its modals and delete confirmation.
//!
//! A [`ListView`] owns a [`TableBinding`] and drives it: table state changes
//! produce a new request, responses are bound through fetch tickets, and
//! mutations end with a cache invalidation and a refetch.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::api::{ApiClient, ApiError, Endpoint, Entity};
use crate::cache::ReferenceCache;
use crate::components::data_table::{
    DataTableConfig, ListEndpoint, Page, TableState, classes_table_config,
    payments_table_config, students_table_config, teachers_table_config, users_table_config,
};
use crate::components::{Applied, FetchTicket, Notice, TableBinding};
use crate::forms::{FormModal, SAVE_FAILED, SAVE_SUCCESS, SubmitOutcome};
use schoolsoft_core::{Class, Payment, Student, Teacher, User};

/// A row type with its own list screen.
pub trait Record: DeserializeOwned + Serialize + Clone + Send + Sync {
    const ENTITY: Entity;

    fn record_id(&self) -> i32;

    fn table_config() -> DataTableConfig;
}

impl Record for Student {
    const ENTITY: Entity = Entity::Student;

    fn record_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn table_config() -> DataTableConfig {
        students_table_config()
    }
}

impl Record for Teacher {
    const ENTITY: Entity = Entity::Teacher;

    fn record_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn table_config() -> DataTableConfig {
        teachers_table_config()
    }
}

impl Record for Class {
    const ENTITY: Entity = Entity::Class;

    fn record_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn table_config() -> DataTableConfig {
        classes_table_config()
    }
}

impl Record for User {
    const ENTITY: Entity = Entity::User;

    fn record_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn table_config() -> DataTableConfig {
        users_table_config()
    }
}

impl Record for Payment {
    const ENTITY: Entity = Entity::Payment;

    fn record_id(&self) -> i32 {
        self.id.as_i32()
    }

    fn table_config() -> DataTableConfig {
        payments_table_config()
    }
}

/// One list screen.
#[derive(Debug)]
pub struct ListView<T> {
    entity: Entity,
    client: ApiClient,
    cache: ReferenceCache,
    endpoint: ListEndpoint,
    config: DataTableConfig,
    binding: TableBinding<T>,
    pending_delete: Option<i32>,
    notice: Option<Notice>,
}

impl<T: Record> ListView<T> {
    /// The standard list screen for `T`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unsupported` if the entity has no list endpoint.
    pub fn new(client: ApiClient, cache: ReferenceCache) -> Result<Self, ApiError> {
        let endpoint = T::ENTITY
            .list_endpoint()
            .ok_or_else(|| ApiError::Unsupported(format!("list {}", T::ENTITY)))?;
        Ok(Self::with_endpoint(
            T::ENTITY,
            client,
            cache,
            endpoint,
            T::table_config(),
        ))
    }
}

impl<T: DeserializeOwned> ListView<T> {
    /// A list screen over a custom endpoint (e.g. the class report).
    #[must_use]
    pub fn with_endpoint(
        entity: Entity,
        client: ApiClient,
        cache: ReferenceCache,
        endpoint: ListEndpoint,
        config: DataTableConfig,
    ) -> Self {
        Self {
            entity,
            client,
            cache,
            endpoint,
            config,
            binding: TableBinding::new(TableState::default()),
            pending_delete: None,
            notice: None,
        }
    }

    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    #[must_use]
    pub const fn config(&self) -> &DataTableConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &TableState {
        self.binding.state()
    }

    #[must_use]
    pub const fn binding(&self) -> &TableBinding<T> {
        &self.binding
    }

    /// Rows currently on screen.
    #[must_use]
    pub const fn page(&self) -> &Page<T> {
        self.binding.page()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Request the current state would be sent as.
    #[must_use]
    pub fn current_request(&self) -> Endpoint {
        self.endpoint.build_request(self.binding.state())
    }

    /// Change table state. Returns `true` if a refetch is now due.
    pub fn update_state(&mut self, change: impl FnOnce(&mut TableState)) -> bool {
        self.binding.update(change);
        self.binding.needs_fetch()
    }

    /// Issue a ticket and the request it stands for.
    ///
    /// Pair with [`ListView::fetch`] and [`ListView::complete`] when several
    /// fetches may be outstanding.
    pub fn start_fetch(&mut self) -> FetchTicket {
        self.binding.begin()
    }

    /// Run the request for `ticket`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    pub async fn fetch(&self, ticket: &FetchTicket) -> Result<Page<T>, ApiError> {
        let request = self.endpoint.build_request(ticket.key());
        self.client.list(&request).await
    }

    /// Bind a fetch result.
    pub fn complete(&mut self, ticket: &FetchTicket, result: Result<Page<T>, ApiError>) -> Applied {
        if let Err(e) = &result {
            tracing::error!(entity = %self.entity, error = %e, "Failed to load table");
        }
        self.binding.apply(ticket, result)
    }

    /// Fetch the current state unconditionally.
    #[instrument(skip(self), fields(entity = %self.entity))]
    pub async fn refresh(&mut self) -> Applied {
        let ticket = self.start_fetch();
        let result = self.fetch(&ticket).await;
        self.complete(&ticket, result)
    }

    /// Fetch only if the bound rows are out of date.
    pub async fn sync(&mut self) -> Option<Applied> {
        if self.binding.needs_fetch() {
            Some(self.refresh().await)
        } else {
            None
        }
    }

    /// Ask for confirmation before deleting `id`.
    pub const fn request_delete(&mut self, id: i32) {
        self.pending_delete = Some(id);
    }

    pub const fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    #[must_use]
    pub const fn pending_delete(&self) -> Option<i32> {
        self.pending_delete
    }

    /// Delete the pending record, then refetch.
    ///
    /// Returns `None` when nothing was pending.
    pub async fn confirm_delete(&mut self) -> Option<Notice> {
        let id = self.pending_delete.take()?;

        let notice = match self.client.delete_record(self.entity, id).await {
            Ok(()) => {
                self.cache.invalidate_after_mutation(self.entity).await;
                Notice::success(SAVE_SUCCESS)
            }
            Err(e) => {
                tracing::error!(entity = %self.entity, id, error = %e, "Failed to delete record");
                Notice::error(SAVE_FAILED)
            }
        };

        self.refresh().await;
        self.notice = Some(notice.clone());
        Some(notice)
    }

    /// Record a modal's outcome and refetch after a save.
    pub async fn after_submit(&mut self, outcome: &SubmitOutcome) {
        if let Some(notice) = outcome.notice() {
            self.notice = Some(notice.clone());
        }
        if outcome.needs_refetch() {
            self.refresh().await;
        }
    }
}

impl<T: Record> ListView<T> {
    /// A create modal for this screen's entity.
    #[must_use]
    pub fn create_form(&self) -> FormModal {
        FormModal::create(self.entity)
    }

    /// An update modal pre-filled from the on-screen row `id`.
    #[must_use]
    pub fn edit_form(&self, id: i32) -> Option<FormModal> {
        self.page()
            .items
            .iter()
            .find(|row| row.record_id() == id)
            .map(|row| FormModal::update(self.entity, id, row))
    }

    /// Open a create/update modal, submit it, and refetch on success.
    pub async fn submit(&mut self, modal: &mut FormModal) -> SubmitOutcome {
        let outcome = modal.submit(&self.client, &self.cache).await;
        self.after_submit(&outcome).await;
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::components::data_table::ColumnFilter;

    fn view<T: Record>() -> ListView<T> {
        let client = ApiClient::new(
            Url::parse("http://127.0.0.1:9/api/").unwrap(),
            Duration::from_millis(200),
        )
        .unwrap();
        let cache = ReferenceCache::new(client.clone());
        ListView::new(client, cache).unwrap()
    }

    #[test]
    fn test_request_tracks_state() {
        let mut payments = view::<Payment>();
        assert!(payments.update_state(|s| s.set_page_index(2)));

        let request = payments.current_request();
        assert_eq!(request.query_value("start"), Some("20"));
        assert_eq!(request.query_value("size"), Some("10"));

        payments.update_state(|s| s.set_global_filter("QWE123"));
        assert_eq!(payments.current_request().to_string(), "payments/search/QWE123");
    }

    #[test]
    fn test_student_list_uses_page_number() {
        let mut students = view::<Student>();
        students.update_state(|s| s.set_column_filter("first_name", "Amina".into()));
        let request = students.current_request();
        assert_eq!(request.query_value("page"), Some("1"));
        assert_eq!(
            request.query_value("filters"),
            Some(serde_json::to_string(&[ColumnFilter::new("first_name", "Amina")]).unwrap().as_str())
        );
    }

    #[test]
    fn test_delete_confirmation_flow() {
        let mut teachers = view::<Teacher>();
        teachers.request_delete(4);
        assert_eq!(teachers.pending_delete(), Some(4));
        teachers.cancel_delete();
        assert_eq!(teachers.pending_delete(), None);
    }

    #[tokio::test]
    async fn test_failed_fetch_sets_error_flag() {
        let mut classes = view::<Class>();
        assert_eq!(classes.refresh().await, Applied::Failed);
        assert!(classes.binding().is_error());
        assert!(classes.page().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_without_pending_is_noop() {
        let mut users = view::<User>();
        assert!(users.confirm_delete().await.is_none());
    }

    #[test]
    fn test_edit_form_requires_visible_row() {
        let users = view::<User>();
        assert!(users.edit_form(1).is_none());
        assert_eq!(users.create_form().entity(), Entity::User);
    }
}
