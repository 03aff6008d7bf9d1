//! SchoolSoft Core - Shared types library.
//!
//! This crate provides the types used across the SchoolSoft dashboard:
//! - `admin` - Dashboard library (API client, table bindings, forms, invoices)
//! - `cli` - Command-line front-end for the dashboard
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! Every record here is owned by the backend API; the dashboard only reads
//! and submits them.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, shilling amounts, enumerations, and entity records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
