//! Remote data table types.
//!
//! A list screen owns a [`TableState`] (page, column filters, global search,
//! sort order). [`ListEndpoint::build_request`] serializes that state into the
//! query string the backend expects, and [`ListEnvelope`] turns the backend's
//! `{items, totalPages, itemsPerPage}` reply back into a [`Page`].
//!
//! Screens disagree on pagination: Students and the Class Report send a
//! 1-based `page`, every other list sends a row offset in `start`. Both
//! conventions are preserved per endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::Endpoint;

/// Default rows per page for every list screen.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Page index (0-based) and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_index: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A per-column filter, serialized as `{"id": ..., "value": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub id: String,
    pub value: Value,
}

impl ColumnFilter {
    #[must_use]
    pub fn new(id: &str, value: impl Into<Value>) -> Self {
        Self {
            id: id.to_string(),
            value: value.into(),
        }
    }
}

/// A sort descriptor, serialized as `{"id": ..., "desc": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub id: String,
    pub desc: bool,
}

impl SortDescriptor {
    #[must_use]
    pub fn asc(id: &str) -> Self {
        Self {
            id: id.to_string(),
            desc: false,
        }
    }

    #[must_use]
    pub fn desc(id: &str) -> Self {
        Self {
            id: id.to_string(),
            desc: true,
        }
    }
}

/// UI-local table state. The whole struct is the query key: any change to it
/// means a new request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    pub pagination: Pagination,
    pub column_filters: Vec<ColumnFilter>,
    pub global_filter: String,
    pub sorting: Vec<SortDescriptor>,
}

impl TableState {
    /// Jump to a page (0-based).
    pub const fn set_page_index(&mut self, page_index: u32) {
        self.pagination.page_index = page_index;
    }

    /// Change the page size. Zero is clamped to one row.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.pagination.page_size = page_size.max(1);
        self.pagination.page_index = 0;
    }

    /// Replace the global search text and return to the first page.
    pub fn set_global_filter(&mut self, text: &str) {
        text.trim().clone_into(&mut self.global_filter);
        self.pagination.page_index = 0;
    }

    /// Set or clear a column filter. `null` and empty strings clear it.
    pub fn set_column_filter(&mut self, id: &str, value: Value) {
        self.column_filters.retain(|f| f.id != id);
        let is_blank = match &value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        if !is_blank {
            self.column_filters.push(ColumnFilter {
                id: id.to_string(),
                value,
            });
        }
        self.pagination.page_index = 0;
    }

    /// Replace the sort order.
    pub fn set_sorting(&mut self, sorting: Vec<SortDescriptor>) {
        self.sorting = sorting;
    }

    /// Trimmed global filter, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        let term = self.global_filter.trim();
        (!term.is_empty()).then_some(term)
    }
}

/// How the page position is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageParam {
    /// `page = pageIndex + 1`
    OneBasedPage,
    /// `start = pageIndex * pageSize`
    Offset,
}

/// How a non-empty global filter reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Switch to `<resource>/search/<term>` and keep the other parameters.
    SearchPath(&'static str),
    /// Always send a `globalFilter` parameter (empty when unset).
    GlobalFilterParam,
}

/// A list endpoint and its query conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEndpoint {
    path: Endpoint,
    page_param: PageParam,
    search: SearchMode,
}

impl ListEndpoint {
    #[must_use]
    pub const fn new(path: Endpoint, page_param: PageParam, search: SearchMode) -> Self {
        Self {
            path,
            page_param,
            search,
        }
    }

    #[must_use]
    pub const fn page_param(&self) -> PageParam {
        self.page_param
    }

    #[must_use]
    pub const fn search_mode(&self) -> &SearchMode {
        &self.search
    }

    /// Serialize table state into a request.
    ///
    /// Parameters are emitted in a fixed order: position, `size`, `filters`,
    /// `globalFilter` (param mode only), `sorting`.
    #[must_use]
    pub fn build_request(&self, state: &TableState) -> Endpoint {
        let Pagination {
            page_index,
            page_size,
        } = state.pagination;

        let mut request = match (&self.search, state.search_term()) {
            (SearchMode::SearchPath(resource), Some(term)) => {
                Endpoint::new(resource).segment("search").segment(term)
            }
            _ => self.path.clone(),
        };

        request = match self.page_param {
            PageParam::OneBasedPage => request.query("page", u64::from(page_index) + 1),
            PageParam::Offset => {
                request.query("start", u64::from(page_index) * u64::from(page_size))
            }
        };

        request = request
            .query("size", page_size)
            .query("filters", encode_json(&state.column_filters));

        if self.search == SearchMode::GlobalFilterParam {
            request = request.query("globalFilter", state.search_term().unwrap_or_default());
        }

        request.query("sorting", encode_json(&state.sorting))
    }
}

fn encode_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

/// Raw list response. Every field may be missing or `null`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnvelope<T> {
    pub items: Option<Vec<T>>,
    pub total_pages: Option<u64>,
    pub items_per_page: Option<u64>,
}

/// A bound page of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u64,
    /// Reported as the table's row count.
    pub items_per_page: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_pages: 0,
            items_per_page: 0,
        }
    }
}

impl<T> Page<T> {
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.items_per_page
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> From<ListEnvelope<T>> for Page<T> {
    fn from(envelope: ListEnvelope<T>) -> Self {
        Self {
            items: envelope.items.unwrap_or_default(),
            total_pages: envelope.total_pages.unwrap_or(0),
            items_per_page: envelope.items_per_page.unwrap_or(0),
        }
    }
}

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Accessor key, also used as the filter/sort id.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    pub sortable: bool,
    pub filterable: bool,
    /// Allowed values for enumerated columns (rendered as a select filter).
    pub options: Vec<String>,
}

impl TableColumn {
    /// A sortable, filterable text column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: true,
            filterable: true,
            options: vec![],
        }
    }

    /// A column with a fixed set of filter values.
    #[must_use]
    pub fn select(key: &str, label: &str, options: &[&str]) -> Self {
        Self {
            options: options.iter().map(ToString::to_string).collect(),
            ..Self::new(key, label)
        }
    }

    /// A display-only column (derived values, actions).
    #[must_use]
    pub const fn display_only(mut self) -> Self {
        self.sortable = false;
        self.filterable = false;
        self
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTableConfig {
    pub table_id: String,
    pub columns: Vec<TableColumn>,
    pub search_placeholder: String,
    pub empty_title: String,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            search_placeholder: "Search...".to_string(),
            empty_title: "No records to display".to_string(),
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Set empty state title.
    #[must_use]
    pub fn empty_state(mut self, title: &str) -> Self {
        self.empty_title = title.to_string();
        self
    }

    /// Look up a column by key.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Whether `key` names a filterable column.
    #[must_use]
    pub fn can_filter(&self, key: &str) -> bool {
        self.find(key).is_some_and(|c| c.filterable)
    }

    /// Whether `key` names a sortable column.
    #[must_use]
    pub fn can_sort(&self, key: &str) -> bool {
        self.find(key).is_some_and(|c| c.sortable)
    }
}

#[must_use]
pub fn students_table_config() -> DataTableConfig {
    DataTableConfig::new("students")
        .column(TableColumn::new("id", "Id"))
        .column(TableColumn::new("first_name", "First Name"))
        .column(TableColumn::new("last_name", "Last Name"))
        .column(TableColumn::new("dob", "DOB"))
        .column(TableColumn::new("Class.name", "Class"))
        .column(TableColumn::new("feeAmount", "Total Fee"))
        .column(TableColumn::new("feeBalance", "Fee Balance"))
        .search_placeholder("Search students...")
}

#[must_use]
pub fn teachers_table_config() -> DataTableConfig {
    DataTableConfig::new("teachers")
        .column(TableColumn::new("id", "Id"))
        .column(TableColumn::new("first_name", "First Name"))
        .column(TableColumn::new("last_name", "Last Name"))
        .column(TableColumn::new("phone", "Phone"))
        .search_placeholder("Search teachers...")
}

#[must_use]
pub fn classes_table_config() -> DataTableConfig {
    DataTableConfig::new("classes")
        .column(TableColumn::new("id", "Id"))
        .column(TableColumn::new("name", "Name"))
        .column(TableColumn::new("teacherId", "Class Teacher"))
        .search_placeholder("Search classes...")
}

#[must_use]
pub fn users_table_config() -> DataTableConfig {
    DataTableConfig::new("users")
        .column(TableColumn::new("id", "Id"))
        .column(TableColumn::new("name", "Name"))
        .column(TableColumn::new("email", "Email"))
        .column(TableColumn::select("role", "Role", &["ADMIN", "USER"]))
        .column(TableColumn::select("activeStatus", "Status", &["true", "false"]))
        .search_placeholder("Search users...")
}

#[must_use]
pub fn payments_table_config() -> DataTableConfig {
    DataTableConfig::new("payments")
        .column(TableColumn::new("id", "Id"))
        .column(TableColumn::new("studentId", "Student Name"))
        .column(TableColumn::select(
            "payment_mode",
            "Payment Mode",
            &["MPESA", "CASH", "BANK", "CHEQUE"],
        ))
        .column(TableColumn::new("createdAt", "Time Stamp"))
        .column(TableColumn::new("classId", "Class"))
        .column(TableColumn::new("amount", "Amount"))
        .search_placeholder("Search payments...")
}

#[must_use]
pub fn class_report_table_config() -> DataTableConfig {
    DataTableConfig::new("class-report")
        .column(TableColumn::new("id", "Id"))
        .column(TableColumn::new("first_name", "Student Name"))
        .column(TableColumn::new("guardianName", "Guardian Name"))
        .column(TableColumn::new("guardianPhone", "Guardian Phone"))
        .column(TableColumn::new("Class.name", "Class"))
        .column(TableColumn::new("feeAmount", "Total Fee"))
        .column(TableColumn::new("feeBalance", "Fee Balance"))
        .search_placeholder("Search students in class...")
        .empty_state("Select a class to view its students")
}
