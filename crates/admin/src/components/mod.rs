//! Reusable dashboard components.

pub mod binding;
pub mod data_table;
pub mod notice;

pub use binding::{Applied, FetchTicket, TableBinding};
pub use data_table::{
    ColumnFilter, DataTableConfig, ListEndpoint, ListEnvelope, Page, PageParam, Pagination,
    SearchMode, SortDescriptor, TableColumn, TableState,
};
pub use notice::{Notice, NoticeKind};
