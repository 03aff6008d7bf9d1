//! Class report.

use std::io::Write;
use std::path::Path;

use schoolsoft_admin::components::Applied;
use schoolsoft_admin::reports::ClassReport;
use schoolsoft_admin::state::AppState;
use schoolsoft_core::ClassId;

use super::CliError;
use super::records::apply_list_args;
use crate::ListArgs;
use crate::output::{write_page_footer, write_table};

/// Show one page of a class's students, optionally saving it as CSV.
pub async fn class(
    state: &AppState,
    class_id: ClassId,
    args: &ListArgs,
    csv: Option<&Path>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut report = ClassReport::new(state.client().clone(), state.cache().clone());
    report.select_class(Some(class_id));

    if let Some(view) = report.view_mut() {
        apply_list_args(view, args)?;
    }
    if report.refresh().await == Some(Applied::Failed) {
        return Err(CliError::Failed(format!(
            "Failed to load students for class {class_id}"
        )));
    }

    if let Some(view) = report.view() {
        write_table(out, view.config(), &view.page().items)?;
        write_page_footer(out, args.page, view.page())?;
    }

    if let Some(path) = csv
        && let Some(contents) = report.export_csv()
    {
        std::fs::write(path, contents)?;
        writeln!(out, "Saved {}", path.display())?;
    }
    Ok(())
}
