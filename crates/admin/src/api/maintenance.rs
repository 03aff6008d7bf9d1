//! Destructive database maintenance actions.
//!
//! Each action must be confirmed by typing its name back before it is sent.
//! The backend answers with a plain-text status line.

use std::fmt;
use std::str::FromStr;

use schoolsoft_core::UserId;
use tracing::instrument;

use super::{ApiClient, ApiError, Endpoint};

/// Message shown when an action fails for any reason.
pub const MAINTENANCE_FAILED: &str = "Error resetting the database";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaintenanceAction {
    /// Clear fee payment records.
    ResetPayments,
    /// Clear transactional data, keep reference data.
    PartialReset,
    /// Clear everything.
    FullReset,
}

impl MaintenanceAction {
    pub const ALL: [Self; 3] = [Self::ResetPayments, Self::PartialReset, Self::FullReset];

    /// Name typed on the command line and as confirmation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ResetPayments => "reset-payments",
            Self::PartialReset => "partial-reset",
            Self::FullReset => "full-reset",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ResetPayments => "Reset Payments Data",
            Self::PartialReset => "Partial Reset Database",
            Self::FullReset => "Full Reset Database",
        }
    }

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::ResetPayments => "reset-reservation-data",
            Self::PartialReset => "partial-reset-database",
            Self::FullReset => "reset-database",
        }
    }

    /// Whether `input` confirms this action.
    #[must_use]
    pub fn is_confirmed_by(self, input: &str) -> bool {
        input.trim() == self.name()
    }
}

impl fmt::Display for MaintenanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaintenanceAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.name() == s.trim())
            .ok_or_else(|| format!("unknown maintenance action: {s}"))
    }
}

impl ApiClient {
    /// Run a maintenance action on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn run_maintenance(
        &self,
        action: MaintenanceAction,
        user_id: UserId,
    ) -> Result<String, ApiError> {
        let endpoint = Endpoint::new(action.path()).query("userId", user_id);
        let message = self.post_for_text(&endpoint).await?;
        tracing::warn!(%action, %user_id, "Maintenance action completed");
        Ok(message)
    }
}
