//! Session commands.

use std::io::Write;

use chrono::{DateTime, Utc};
use schoolsoft_admin::state::AppState;
use secrecy::SecretString;

use super::CliError;

/// Sign in and persist the session.
pub async fn login(
    state: &AppState,
    email: &str,
    password: String,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let session = state
        .login(email, SecretString::from(password), Utc::now())
        .await?;
    writeln!(out, "Signed in as {} ({})", session.name, session.email)?;
    Ok(())
}

pub async fn logout(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    state.logout().await?;
    writeln!(out, "Signed out")?;
    Ok(())
}

/// Show the stored session, or why there is none.
pub fn whoami(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    let session = state.session().require_active(Utc::now())?;
    let expires = DateTime::<Utc>::from_timestamp_millis(session.expires_at)
        .map_or_else(|| session.expires_at.to_string(), |at| at.to_rfc3339());

    writeln!(out, "name:    {}", session.name)?;
    writeln!(out, "email:   {}", session.email)?;
    writeln!(
        out,
        "role:    {}",
        session.role.map_or("-", |role| role.as_str())
    )?;
    writeln!(out, "user id: {}", session.user_id)?;
    writeln!(out, "expires: {expires}")?;
    Ok(())
}
