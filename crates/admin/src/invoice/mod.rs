//! Payment invoices.
//!
//! An invoice is resolved from a payment plus the cached reference lists
//! (students, classes, school), laid out on a fixed A4 page, and written as a
//! PDF. Missing references render as placeholder text rather than failing.
//!
//! # Modules
//!
//! - [`layout`] - Page positions of every text item and table rule
//! - [`pdf`] - Minimal single-page PDF writer
//! - [`print`] - Handing the finished file to a viewer or printer

pub mod layout;
pub mod pdf;
pub mod print;

use chrono::NaiveDateTime;
use schoolsoft_core::{Class, Kes, Payment, School, Student};
use thiserror::Error;

use crate::api::ApiError;
use crate::cache::ReferenceCache;

pub use layout::{InvoiceDocument, layout};
pub use print::{CommandPrinter, PrintSink, sweep_stale, write_transient};

pub const STUDENT_NOT_FOUND: &str = "Student not found";
pub const GUARDIAN_NOT_FOUND: &str = "Guardian not found";
pub const BALANCE_NOT_FOUND: &str = "Balance not found";
pub const CLASS_NOT_FOUND: &str = "Class not found";
pub const DEFAULT_SCHOOL_NAME: &str = "SchoolSoft";

/// Shown in the preview pane when generation failed.
pub const NO_PDF: &str = "No PDF to display";

const DATE_PAID_FORMAT: &str = "%d %b %Y %H:%M:%S";

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Failed to load invoice references: {0}")]
    References(#[from] ApiError),

    #[error("Failed to write invoice: {0}")]
    Io(#[from] std::io::Error),

    #[error("Print command `{command}` failed: {reason}")]
    Print { command: String, reason: String },
}

/// Every string printed on an invoice, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceData {
    pub school_name: String,
    pub school_address: String,
    pub school_address2: String,
    pub school_phone: String,
    pub school_phone2: String,
    pub school_email: String,
    pub school_town: String,
    pub student_name: String,
    pub class_name: String,
    pub guardian_name: String,
    pub date_paid: String,
    pub amount: String,
    pub balance_due: String,
    pub payment_mode: String,
    pub served_by: String,
    pub bank_account: String,
    pub bank_name: String,
    pub mpesa_info: String,
}

impl InvoiceData {
    /// Resolve display strings for `payment` against the reference lists.
    ///
    /// `generated_at` is printed as the payment date.
    #[must_use]
    pub fn resolve(
        payment: &Payment,
        students: &[Student],
        classes: &[Class],
        school: &School,
        served_by: &str,
        generated_at: NaiveDateTime,
    ) -> Self {
        let student = students.iter().find(|s| s.id == payment.student_id);
        let class = payment
            .class_id
            .and_then(|id| classes.iter().find(|c| c.id == id));

        let text = |field: &Option<String>| field.clone().unwrap_or_default();

        Self {
            school_name: school
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_SCHOOL_NAME.to_string()),
            school_address: text(&school.address),
            school_address2: text(&school.address2),
            school_phone: text(&school.phone),
            school_phone2: text(&school.phone2),
            school_email: text(&school.email),
            school_town: text(&school.town),
            student_name: student.map_or_else(|| STUDENT_NOT_FOUND.to_string(), Student::full_name),
            class_name: class.map_or_else(|| CLASS_NOT_FOUND.to_string(), |c| c.name.clone()),
            guardian_name: student
                .and_then(|s| s.guardian_name.clone())
                .unwrap_or_else(|| GUARDIAN_NOT_FOUND.to_string()),
            date_paid: generated_at.format(DATE_PAID_FORMAT).to_string(),
            amount: payment.amount.to_string(),
            balance_due: student.map_or_else(
                || BALANCE_NOT_FOUND.to_string(),
                |s| Kes::display_or_zero(s.fee_balance),
            ),
            payment_mode: payment.payment_mode.to_string(),
            served_by: served_by.to_string(),
            bank_account: text(&school.bank_acc),
            bank_name: text(&school.bank_name),
            mpesa_info: text(&school.mpesa_info),
        }
    }

    /// Resolve against the reference cache, fetching whatever is stale.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::References` if a reference list cannot be loaded.
    pub async fn load(
        cache: &ReferenceCache,
        payment: &Payment,
        served_by: &str,
        generated_at: NaiveDateTime,
    ) -> Result<Self, InvoiceError> {
        let (students, classes, school) =
            tokio::try_join!(cache.students(), cache.classes(), cache.school())?;

        Ok(Self::resolve(
            payment,
            &students.value,
            &classes.value,
            &school.value,
            served_by,
            generated_at,
        ))
    }
}

/// Lay out and encode an invoice.
#[must_use]
pub fn render_invoice(data: &InvoiceData) -> Vec<u8> {
    pdf::write_pdf(&layout(data))
}

/// The invoice preview pane.
///
/// Failures are logged and leave the pane empty; they never propagate to the
/// payments screen.
#[derive(Debug, Clone, Default)]
pub struct InvoicePreview {
    pdf: Option<Vec<u8>>,
}

impl InvoicePreview {
    /// Generate the invoice for `payment`.
    pub async fn generate(
        cache: &ReferenceCache,
        payment: &Payment,
        served_by: &str,
        generated_at: NaiveDateTime,
    ) -> Self {
        match InvoiceData::load(cache, payment, served_by, generated_at).await {
            Ok(data) => Self {
                pdf: Some(render_invoice(&data)),
            },
            Err(e) => {
                tracing::error!(payment_id = %payment.id, error = %e, "Failed to generate invoice");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn pdf(&self) -> Option<&[u8]> {
        self.pdf.as_deref()
    }

    /// Status line for the pane: `None` when a document is available.
    #[must_use]
    pub const fn message(&self) -> Option<&'static str> {
        match self.pdf {
            Some(_) => None,
            None => Some(NO_PDF),
        }
    }

    /// Send the document to `sink`. Returns whether anything was printed.
    pub async fn print(&self, sink: &impl PrintSink) -> bool {
        let Some(pdf) = self.pdf.as_deref() else {
            tracing::warn!("Print requested with no invoice generated");
            return false;
        };
        match sink.print(pdf).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to print invoice");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    pub(crate) fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap()
    }

    fn payment() -> Payment {
        serde_json::from_value(json!({
            "id": 31,
            "studentId": 1,
            "classId": 3,
            "amount": 2500,
            "payment_mode": "MPESA",
            "reference": "QWE123RTY"
        }))
        .unwrap()
    }

    fn students() -> Vec<Student> {
        serde_json::from_value(json!([{
            "id": 1,
            "first_name": "Amina",
            "last_name": "Otieno",
            "guardianName": "Grace Otieno",
            "classId": 3,
            "feeBalance": 12500
        }]))
        .unwrap()
    }

    fn classes() -> Vec<Class> {
        serde_json::from_value(json!([{"id": 3, "name": "Grade 4"}])).unwrap()
    }

    fn school() -> School {
        serde_json::from_value(json!({
            "name": "Hillside Academy",
            "phone": "0712345678",
            "phone2": "0733000111",
            "email": "office@hillside.ac.ke",
            "town": "Nakuru",
            "bankAcc": "0100234",
            "bankName": "KCB",
            "mpesaInfo": "Paybill 522522"
        }))
        .unwrap()
    }

    pub(crate) fn sample_data() -> InvoiceData {
        InvoiceData::resolve(
            &payment(),
            &students(),
            &classes(),
            &school(),
            "Jane Wanjiru",
            generated_at(),
        )
    }

    #[test]
    fn test_resolve_found_references() {
        let data = sample_data();
        assert_eq!(data.student_name, "Amina Otieno");
        assert_eq!(data.class_name, "Grade 4");
        assert_eq!(data.guardian_name, "Grace Otieno");
        assert_eq!(data.amount, "KES 2,500.00");
        assert_eq!(data.balance_due, "KES 12,500.00");
        assert_eq!(data.payment_mode, "MPESA");
        assert_eq!(data.date_paid, "05 Mar 2024 14:03:09");
        assert_eq!(data.school_address, "");
    }

    #[test]
    fn test_resolve_placeholders() {
        let data = InvoiceData::resolve(
            &payment(),
            &[],
            &[],
            &School::default(),
            "Jane",
            generated_at(),
        );
        assert_eq!(data.student_name, STUDENT_NOT_FOUND);
        assert_eq!(data.guardian_name, GUARDIAN_NOT_FOUND);
        assert_eq!(data.balance_due, BALANCE_NOT_FOUND);
        assert_eq!(data.class_name, CLASS_NOT_FOUND);
        assert_eq!(data.school_name, DEFAULT_SCHOOL_NAME);
        assert_eq!(data.bank_name, "");
    }

    #[test]
    fn test_missing_balance_shows_zero() {
        let mut students = students();
        students[0].fee_balance = None;
        let data = InvoiceData::resolve(
            &payment(),
            &students,
            &classes(),
            &school(),
            "Jane",
            generated_at(),
        );
        assert_eq!(data.balance_due, "KES 0.00");
    }

    #[tokio::test]
    async fn test_preview_failure_is_swallowed() {
        let client = crate::api::ApiClient::new(
            url::Url::parse("http://127.0.0.1:9/api/").unwrap(),
            std::time::Duration::from_millis(100),
        )
        .unwrap();
        let cache = ReferenceCache::new(client);

        let preview = InvoicePreview::generate(&cache, &payment(), "Jane", generated_at()).await;
        assert!(preview.pdf().is_none());
        assert_eq!(preview.message(), Some(NO_PDF));
    }

    #[derive(Default)]
    struct RecordingSink {
        printed: Mutex<Vec<usize>>,
    }

    impl PrintSink for RecordingSink {
        async fn print(&self, pdf: &[u8]) -> Result<(), InvoiceError> {
            self.printed.lock().unwrap().push(pdf.len());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_print_sends_document() {
        let sink = RecordingSink::default();
        assert!(!InvoicePreview::default().print(&sink).await);

        let preview = InvoicePreview {
            pdf: Some(render_invoice(&sample_data())),
        };
        assert!(preview.message().is_none());
        assert!(preview.print(&sink).await);
        assert_eq!(sink.printed.lock().unwrap().len(), 1);
    }
}
