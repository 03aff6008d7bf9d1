//! Payment invoices.

use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use schoolsoft_admin::invoice::{CommandPrinter, InvoicePreview, NO_PDF};
use schoolsoft_admin::session::Session;
use schoolsoft_admin::state::AppState;
use schoolsoft_admin::views::ListView;
use schoolsoft_core::Payment;

use super::CliError;
use super::records::locate;

#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    pub payment_id: i32,
    pub out: Option<PathBuf>,
    pub print: bool,
    pub preview: bool,
}

/// Generate the invoice for a payment and deliver it.
///
/// Generation failures leave nothing to deliver; they are reported as
/// "No PDF to display" rather than as an error.
pub async fn run(
    state: &AppState,
    session: &Session,
    request: &InvoiceRequest,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut view = ListView::<Payment>::new(state.client().clone(), state.cache().clone())?;
    locate(&mut view, request.payment_id).await?;
    let Some(payment) = view
        .page()
        .items
        .iter()
        .find(|payment| payment.id.as_i32() == request.payment_id)
    else {
        return Ok(());
    };

    let preview = InvoicePreview::generate(
        state.cache(),
        payment,
        &session.name,
        Local::now().naive_local(),
    )
    .await;

    let Some(pdf) = preview.pdf() else {
        writeln!(out, "{NO_PDF}")?;
        return Ok(());
    };

    if let Some(path) = &request.out {
        std::fs::write(path, pdf)?;
        writeln!(out, "Saved {}", path.display())?;
    }
    if request.preview {
        preview
            .print(&CommandPrinter::viewer(&state.config().view_command))
            .await;
    }
    if request.print
        && preview
            .print(&CommandPrinter::new(&state.config().print_command))
            .await
    {
        writeln!(out, "Sent to printer")?;
    }
    if request.out.is_none() && !request.print && !request.preview {
        writeln!(out, "Invoice generated ({} bytes); use --out, --preview or --print", pdf.len())?;
    }
    Ok(())
}
