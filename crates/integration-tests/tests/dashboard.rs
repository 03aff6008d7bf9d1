//! Dashboard counts and charts.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::Method;
use schoolsoft_admin::api::ApiError;
use schoolsoft_admin::widgets::{CHART_PALETTE, DashboardData, load_fee_status};
use schoolsoft_core::ClassId;
use schoolsoft_integration_tests::{FakeBackend, Reply};
use serde_json::json;

fn serve_counts(backend: &FakeBackend) {
    backend.on(
        Method::GET,
        "students/count",
        Reply::json(json!({"totalStudents": 120})),
    );
    backend.on(
        Method::GET,
        "teachers/count",
        Reply::json(json!({"totalTeachers": "9"})),
    );
    backend.on(Method::GET, "classes/count", Reply::json(json!({})));
}

#[tokio::test]
async fn test_dashboard_counts_and_payment_modes() {
    let backend = FakeBackend::start().await;
    serve_counts(&backend);
    backend.on(
        Method::GET,
        "payments/get/paymentmodes",
        Reply::json(json!({"todayRevenueByPaymentMode": [
            {"name": "MPESA", "value": 1500},
            {"name": "CASH", "value": 0},
        ]})),
    );

    let data = DashboardData::fetch(&backend.client()).await.unwrap();
    assert_eq!(data.students, 120);
    assert_eq!(data.teachers, 9);
    assert_eq!(data.classes, 0);

    let chart = data.payment_modes_chart();
    let slices = chart.slices();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].label.as_deref(), Some("MPESA : KES 1,500.00"));
    assert_eq!(slices[0].color, CHART_PALETTE[0]);
    assert!(slices[1].label.is_none());
}

#[tokio::test]
async fn test_no_payments_today_is_empty_chart() {
    let backend = FakeBackend::start().await;
    serve_counts(&backend);
    backend.on(
        Method::GET,
        "payments/get/paymentmodes",
        Reply::json(json!({"todayRevenueByPaymentMode": null})),
    );

    let data = DashboardData::fetch(&backend.client()).await.unwrap();
    assert!(data.payment_modes_chart().is_empty());
}

#[tokio::test]
async fn test_one_failing_count_fails_the_screen() {
    let backend = FakeBackend::start().await;
    serve_counts(&backend);
    backend.on(Method::GET, "classes/count", Reply::error(503, "maintenance"));
    backend.on(
        Method::GET,
        "payments/get/paymentmodes",
        Reply::json(json!({"todayRevenueByPaymentMode": []})),
    );

    let err = DashboardData::fetch(&backend.client()).await.unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_fee_status_waits_for_class() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::GET,
        "students/fee-status/4",
        Reply::json(json!([
            {"name": "fully paid", "value": 12},
            {"name": "not paid", "value": 3},
        ])),
    );
    let client = backend.client();

    assert!(load_fee_status(&client, None).await.unwrap().is_none());
    assert!(backend.requests().is_empty());

    let chart = load_fee_status(&client, Some(ClassId::new(4)))
        .await
        .unwrap()
        .unwrap();
    let labels: Vec<_> = chart
        .slices()
        .iter()
        .map(|slice| slice.label.clone().unwrap())
        .collect();
    assert_eq!(labels, vec!["Fully Paid", "Not Paid"]);
}
