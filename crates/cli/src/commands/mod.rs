//! Command implementations.
//!
//! Each command drives the dashboard library the way its screen would and
//! writes plain text to the given writer.

pub mod auth;
pub mod dashboard;
pub mod invoice;
pub mod maintenance;
pub mod records;
pub mod report;
pub mod school;

use std::io::Write;
use std::str::FromStr;

use schoolsoft_admin::AppError;
use schoolsoft_admin::api::ApiError;
use schoolsoft_admin::forms::{FormModal, SubmitOutcome};
use schoolsoft_admin::invoice::InvoiceError;
use schoolsoft_admin::session::SessionError;
use thiserror::Error;

/// Errors that end a command with exit code 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad arguments.
    #[error("{0}")]
    Usage(String),

    /// The backend refused the change; the notice has already been printed.
    #[error("{0}")]
    Failed(String),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::App(err.into())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        Self::App(err.into())
    }
}

impl From<InvoiceError> for CliError {
    fn from(err: InvoiceError) -> Self {
        Self::App(err.into())
    }
}

impl CliError {
    /// Log the error; server-side failures also go to Sentry.
    pub fn report(&self) {
        match self {
            Self::App(e) => e.report(),
            Self::Io(e) => tracing::error!(error = %e, "Command failed"),
            Self::Usage(_) | Self::Failed(_) => tracing::debug!(error = %self, "Command failed"),
        }
    }

    /// Message printed to stderr.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::App(e) => e.user_message(),
            _ => self.to_string(),
        }
    }
}

/// A `name=value` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldArg {
    pub name: String,
    pub value: String,
}

impl FromStr for FieldArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got `{s}`"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing field name in `{s}`"));
        }
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Copy `fields` into `modal`, rejecting names its schema does not know.
pub fn apply_fields(modal: &mut FormModal, fields: &[FieldArg]) -> Result<(), CliError> {
    for field in fields {
        if modal.schema().rule(&field.name).is_none() {
            let known: Vec<&str> = modal.schema().rules().iter().map(|r| r.name()).collect();
            return Err(CliError::Usage(format!(
                "unknown field `{}` for {}; expected one of {}",
                field.name,
                modal.entity(),
                known.join(", ")
            )));
        }
        modal.set(&field.name, field.value.clone());
    }
    Ok(())
}

/// Print a submit outcome; anything but a save is an error.
pub fn finish_submit(outcome: SubmitOutcome, out: &mut impl Write) -> Result<(), CliError> {
    match outcome {
        SubmitOutcome::Saved { notice, response } => {
            writeln!(out, "{}", notice.message)?;
            if let Some(id) = response.get("id") {
                writeln!(out, "id: {id}")?;
            }
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            for (field, message) in errors.iter() {
                writeln!(out, "{field}: {message}")?;
            }
            Err(CliError::App(AppError::Validation(errors)))
        }
        SubmitOutcome::Failed { notice, error } => {
            tracing::debug!(error = %error, "Save failed");
            Err(CliError::Failed(notice.message))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use schoolsoft_admin::api::Entity;
    use schoolsoft_admin::components::Notice;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_field_arg_parsing() {
        let arg: FieldArg = "guardianName=Grace = Otieno".parse().unwrap();
        assert_eq!(arg.name, "guardianName");
        assert_eq!(arg.value, "Grace = Otieno");

        let arg: FieldArg = "reference=".parse().unwrap();
        assert_eq!(arg.value, "");

        assert!("amount".parse::<FieldArg>().is_err());
        assert!("=5".parse::<FieldArg>().is_err());
    }

    #[test]
    fn test_apply_fields_rejects_unknown() {
        let mut modal = FormModal::create(Entity::Class);
        let err = apply_fields(
            &mut modal,
            &[FieldArg {
                name: "colour".to_string(),
                value: "red".to_string(),
            }],
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown field `colour`"));

        apply_fields(
            &mut modal,
            &[FieldArg {
                name: "name".to_string(),
                value: "Grade 4".to_string(),
            }],
        )
        .unwrap();
        assert_eq!(modal.value("name"), Some("Grade 4"));
    }

    #[test]
    fn test_finish_submit_output() {
        let mut out = Vec::new();
        finish_submit(
            SubmitOutcome::Saved {
                notice: Notice::success("Data Updated Success."),
                response: json!({"id": 7}),
            },
            &mut out,
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Data Updated Success.\nid: 7\n");
    }
}
