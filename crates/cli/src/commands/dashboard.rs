//! Dashboard widgets.

use std::io::Write;

use schoolsoft_admin::state::AppState;
use schoolsoft_admin::widgets::{DashboardData, load_fee_status};
use schoolsoft_core::ClassId;

use super::CliError;
use crate::output::write_chart;

pub async fn show(state: &AppState, out: &mut impl Write) -> Result<(), CliError> {
    let data = DashboardData::fetch(state.client()).await?;

    writeln!(out, "Students: {}", data.students)?;
    writeln!(out, "Teachers: {}", data.teachers)?;
    writeln!(out, "Classes:  {}", data.classes)?;
    writeln!(out)?;
    write_chart(out, "Today's payments by mode", &data.payment_modes_chart())?;
    Ok(())
}

pub async fn fee_status(
    state: &AppState,
    class_id: ClassId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if let Some(chart) = load_fee_status(state.client(), Some(class_id)).await? {
        write_chart(out, &format!("Fee status for class {class_id}"), &chart)?;
    }
    Ok(())
}
