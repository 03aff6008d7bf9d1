//! Invoice generation from cached reference data.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use chrono::NaiveDate;
use schoolsoft_admin::invoice::{
    BALANCE_NOT_FOUND, CLASS_NOT_FOUND, DEFAULT_SCHOOL_NAME, GUARDIAN_NOT_FOUND, InvoiceData,
    InvoicePreview, NO_PDF, STUDENT_NOT_FOUND,
};
use schoolsoft_core::Payment;
use schoolsoft_integration_tests::fixtures::{class, payment, school, student};
use schoolsoft_integration_tests::{FakeBackend, Reply};
use serde_json::json;

fn generated_at() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(14, 3, 9)
        .unwrap()
}

fn serve_references(backend: &FakeBackend) {
    backend.on(
        Method::GET,
        "students/all",
        Reply::json(json!({"student": [student(1, "Amina", "Otieno", 4, 12_500)]})),
    );
    backend.on(
        Method::GET,
        "classes/all",
        Reply::json(json!({"grade": [class(4, "Grade 4")]})),
    );
    backend.on(Method::GET, "schools/all", Reply::json(school()));
}

#[tokio::test]
async fn test_invoice_resolves_through_cache() {
    let backend = FakeBackend::start().await;
    serve_references(&backend);
    let state = backend.state().await;
    let paid: Payment = serde_json::from_value(payment(7, 1, 4, 2_500)).unwrap();

    let data = InvoiceData::load(state.cache(), &paid, "Jane Wanjiru", generated_at())
        .await
        .unwrap();
    assert_eq!(data.school_name, "Hillside Academy");
    assert_eq!(data.student_name, "Amina Otieno");
    assert_eq!(data.class_name, "Grade 4");
    assert_eq!(data.guardian_name, "Mary Otieno");
    assert_eq!(data.amount, "KES 2,500.00");
    assert_eq!(data.balance_due, "KES 12,500.00");
    assert_eq!(data.payment_mode, "MPESA");
    assert_eq!(data.date_paid, "05 Mar 2024 14:03:09");
    assert_eq!(data.served_by, "Jane Wanjiru");

    // A second invoice reuses the cached lists.
    InvoiceData::load(state.cache(), &paid, "Jane Wanjiru", generated_at())
        .await
        .unwrap();
    assert_eq!(backend.requests_to("students/all").len(), 1);
    assert_eq!(backend.requests_to("classes/all").len(), 1);
    assert_eq!(backend.requests_to("schools/all").len(), 1);
}

#[tokio::test]
async fn test_missing_references_use_placeholders() {
    let backend = FakeBackend::start().await;
    backend.on(Method::GET, "students/all", Reply::json(json!({"student": []})));
    backend.on(Method::GET, "classes/all", Reply::json(json!({"grade": null})));
    backend.on(Method::GET, "schools/all", Reply::json(json!(null)));
    let state = backend.state().await;
    let paid: Payment = serde_json::from_value(payment(7, 99, 42, 2_500)).unwrap();

    let data = InvoiceData::load(state.cache(), &paid, "Jane Wanjiru", generated_at())
        .await
        .unwrap();
    assert_eq!(data.school_name, DEFAULT_SCHOOL_NAME);
    assert_eq!(data.student_name, STUDENT_NOT_FOUND);
    assert_eq!(data.guardian_name, GUARDIAN_NOT_FOUND);
    assert_eq!(data.balance_due, BALANCE_NOT_FOUND);
    assert_eq!(data.class_name, CLASS_NOT_FOUND);
}

#[tokio::test]
async fn test_preview_renders_pdf() {
    let backend = FakeBackend::start().await;
    serve_references(&backend);
    let state = backend.state().await;
    let paid: Payment = serde_json::from_value(payment(7, 1, 4, 2_500)).unwrap();

    let preview =
        InvoicePreview::generate(state.cache(), &paid, "Jane Wanjiru", generated_at()).await;
    assert!(preview.message().is_none());

    let pdf = preview.pdf().unwrap();
    assert!(pdf.starts_with(b"%PDF-1.4"));
    let text = String::from_utf8_lossy(pdf);
    assert!(text.contains("(Name: Amina Otieno)"));
    assert!(text.contains("(Served By: Jane Wanjiru)"));
    assert!(text.trim_end().ends_with("%%EOF"));
}

#[tokio::test]
async fn test_preview_is_empty_when_references_fail() {
    let backend = FakeBackend::start().await;
    serve_references(&backend);
    backend.on(Method::GET, "schools/all", Reply::error(500, "down"));
    let state = backend.state().await;
    let paid: Payment = serde_json::from_value(payment(7, 1, 4, 2_500)).unwrap();

    let preview =
        InvoicePreview::generate(state.cache(), &paid, "Jane Wanjiru", generated_at()).await;
    assert!(preview.pdf().is_none());
    assert_eq!(preview.message(), Some(NO_PDF));
}
