//! SchoolSoft dashboard library.
//!
//! A headless rendition of the school administration dashboard: every
//! screen's state, requests and rules live here so they can be driven by the
//! `schoolsoft` CLI or tested without a browser.
//!
//! # Modules
//!
//! - [`api`] - Backend HTTP client and per-entity endpoints
//! - [`cache`] - Reference lists with TTL and mutation-driven invalidation
//! - [`components`] - Table state, fetch binding and notices
//! - [`config`] - Environment configuration
//! - [`error`] - Application error type and Sentry reporting
//! - [`forms`] - Field schemas and create/update modals
//! - [`invoice`] - Payment invoice layout, PDF output and printing
//! - [`reports`] - Class report and CSV export
//! - [`session`] - Persisted login session
//! - [`state`] - Shared application state
//! - [`views`] - List screens
//! - [`widgets`] - Dashboard counts and charts
//!
//! # Security
//!
//! The session token grants the signed-in staff member's full backend
//! access. It is stored in the local state directory and never logged.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod components;
pub mod config;
pub mod error;
pub mod forms;
pub mod invoice;
pub mod reports;
pub mod session;
pub mod state;
pub mod views;
pub mod widgets;

pub use error::AppError;
pub use state::AppState;
