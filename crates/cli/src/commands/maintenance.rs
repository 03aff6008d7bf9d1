//! Database reset actions.

use std::io::Write;

use schoolsoft_admin::api::MaintenanceAction;
use schoolsoft_admin::api::maintenance::MAINTENANCE_FAILED;
use schoolsoft_admin::session::Session;
use schoolsoft_admin::state::AppState;

use super::CliError;

/// Run `action` once `confirm` repeats its name.
pub async fn run(
    state: &AppState,
    session: &Session,
    action: MaintenanceAction,
    confirm: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if !action.is_confirmed_by(confirm) {
        return Err(CliError::Usage(format!(
            "{}: type `--confirm {}` to proceed",
            action.title(),
            action.name()
        )));
    }

    match state.client().run_maintenance(action, session.user_id).await {
        Ok(message) => {
            state.cache().clear().await;
            writeln!(out, "{message}")?;
            Ok(())
        }
        Err(e) => {
            tracing::error!(action = %action, error = %e, "Maintenance action failed");
            Err(CliError::Failed(MAINTENANCE_FAILED.to_string()))
        }
    }
}
