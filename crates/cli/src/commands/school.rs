//! School settings.

use std::io::Write;

use schoolsoft_admin::AppError;
use schoolsoft_admin::api::Entity;
use schoolsoft_admin::forms::FormModal;
use schoolsoft_admin::state::AppState;

use super::{CliError, FieldArg, apply_fields, finish_submit};

pub async fn show(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    let school = state.cache().school().await?.value;

    let rows = [
        ("Name", &school.name),
        ("Motto", &school.school_motto),
        ("Email", &school.email),
        ("Phone", &school.phone),
        ("Phone 2", &school.phone2),
        ("Address", &school.address),
        ("Address 2", &school.address2),
        ("Town", &school.town),
        ("Mpesa", &school.mpesa_info),
        ("Bank", &school.bank_name),
        ("Account No", &school.bank_acc),
    ];
    for (label, value) in rows {
        writeln!(out, "{label:<10}  {}", value.as_deref().unwrap_or_default())?;
    }
    Ok(())
}

pub async fn update(
    state: &AppState,
    fields: &[FieldArg],
    out: &mut impl Write,
) -> Result<(), CliError> {
    let school = state.cache().school().await?.value;
    let id = school
        .id
        .ok_or_else(|| AppError::NotFound("school settings".to_string()))?;

    let mut modal = FormModal::update(Entity::School, id.as_i32(), &*school);
    apply_fields(&mut modal, fields)?;
    finish_submit(modal.submit(state.client(), state.cache()).await, out)
}
