//! Binding between a table's query key and the rows on screen.
//!
//! Every fetch is issued a [`FetchTicket`] carrying a sequence number and a
//! snapshot of the [`TableState`] it was built from. Only the result for the
//! most recently issued ticket is bound; anything older is dropped. This keeps
//! a slow response for page 2 from overwriting page 3 after the user has
//! already moved on.
//!
//! Rows from the last successful fetch stay visible while a new fetch is in
//! flight and after a failed one.

use super::data_table::{Page, TableState};

/// Handle for one in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    key: TableState,
}

impl FetchTicket {
    /// Table state the request must be built from.
    #[must_use]
    pub const fn key(&self) -> &TableState {
        &self.key
    }

    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

/// Outcome of handing a fetch result back to the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Rows replaced.
    Bound,
    /// Fetch failed; previous rows kept and the error flag set.
    Failed,
    /// A newer ticket exists; result ignored.
    Stale,
}

/// Table state plus the page currently bound to it.
#[derive(Debug, Clone)]
pub struct TableBinding<T> {
    state: TableState,
    page: Page<T>,
    bound_key: Option<TableState>,
    issued: u64,
    in_flight: Option<u64>,
    is_error: bool,
}

impl<T> TableBinding<T> {
    #[must_use]
    pub fn new(state: TableState) -> Self {
        Self {
            state,
            page: Page::default(),
            bound_key: None,
            issued: 0,
            in_flight: None,
            is_error: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &TableState {
        &self.state
    }

    /// Mutate the table state. Returns `true` if the query key changed.
    pub fn update(&mut self, change: impl FnOnce(&mut TableState)) -> bool {
        let before = self.state.clone();
        change(&mut self.state);
        before != self.state
    }

    /// Whether the bound rows do not belong to the current query key.
    #[must_use]
    pub fn needs_fetch(&self) -> bool {
        self.bound_key.as_ref() != Some(&self.state)
    }

    /// Issue a ticket for the current state. Any earlier ticket becomes stale.
    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        self.in_flight = Some(self.issued);
        FetchTicket {
            seq: self.issued,
            key: self.state.clone(),
        }
    }

    /// Hand back a fetch result.
    pub fn apply<E>(&mut self, ticket: &FetchTicket, result: Result<Page<T>, E>) -> Applied {
        if ticket.seq != self.issued {
            tracing::debug!(
                ticket = ticket.seq,
                latest = self.issued,
                "Dropping stale table response"
            );
            return Applied::Stale;
        }

        self.in_flight = None;
        match result {
            Ok(page) => {
                self.page = page;
                self.bound_key = Some(ticket.key.clone());
                self.is_error = false;
                Applied::Bound
            }
            Err(_) => {
                self.is_error = true;
                Applied::Failed
            }
        }
    }

    /// Rows currently on screen.
    #[must_use]
    pub const fn page(&self) -> &Page<T> {
        &self.page
    }

    /// No data has ever been bound and a fetch is running.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some() && self.bound_key.is_none()
    }

    /// A fetch is running while previous rows are shown.
    #[must_use]
    pub const fn is_refetching(&self) -> bool {
        self.in_flight.is_some() && self.bound_key.is_some()
    }

    /// The latest fetch failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }
}
