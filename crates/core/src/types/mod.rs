//! Core types for SchoolSoft.
//!
//! This module provides type-safe wrappers for the school's domain records.

pub mod choice;
pub mod email;
pub mod entity;
pub mod id;
pub mod money;

pub use choice::{ChoiceError, Gender, PaymentMode, Role};
pub use email::{Email, EmailError};
pub use entity::*;
pub use id::*;
pub use money::Kes;
