//! Maintenance actions and reference cache behavior.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use axum::http::Method;
use schoolsoft_admin::api::{ApiError, Entity, MaintenanceAction};
use schoolsoft_admin::cache::{RefKey, ReferenceCache};
use schoolsoft_admin::forms::FormModal;
use schoolsoft_core::UserId;
use schoolsoft_integration_tests::fixtures::{class, school, student};
use schoolsoft_integration_tests::{FakeBackend, Reply};
use serde_json::json;

#[tokio::test]
async fn test_maintenance_posts_user_id_and_returns_text() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::POST,
        "partial-reset-database",
        Reply::text("Database partially reset"),
    );

    let message = backend
        .client()
        .run_maintenance(MaintenanceAction::PartialReset, UserId::new(3))
        .await
        .unwrap();
    assert_eq!(message, "Database partially reset");

    let request = &backend.requests_to("partial-reset-database")[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.query_value("userId"), Some("3"));
    assert!(request.body.is_none());
}

#[tokio::test]
async fn test_maintenance_failure_surfaces_status() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::POST,
        "reset-database",
        Reply::error(500, "reset failed"),
    );

    let err = backend
        .client()
        .run_maintenance(MaintenanceAction::FullReset, UserId::new(3))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 500, ref message } if message == "reset failed"));
}

#[tokio::test]
async fn test_cache_hit_avoids_network() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::GET,
        "students/all",
        Reply::json(json!({"student": [student(1, "Amina", "Otieno", 4, 0)]})),
    );
    let cache = ReferenceCache::new(backend.client());

    let first = cache.students().await.unwrap();
    let second = cache.students().await.unwrap();
    assert!(!first.is_cached());
    assert!(second.is_cached());
    assert_eq!(second.value.len(), 1);
    assert_eq!(backend.requests_to("students/all").len(), 1);
}

#[tokio::test]
async fn test_mutation_invalidates_only_affected_lists() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::GET,
        "students/all",
        Reply::json(json!({"student": [student(1, "Amina", "Otieno", 4, 0)]})),
    );
    backend.on(Method::GET, "schools/all", Reply::json(school()));
    let cache = ReferenceCache::new(backend.client());

    cache.students().await.unwrap();
    cache.school().await.unwrap();

    cache.invalidate_after_mutation(Entity::Payment).await;
    assert!(cache.peek(RefKey::Students).await.is_none());
    assert!(cache.peek(RefKey::School).await.is_some());

    cache.invalidate_after_mutation(Entity::User).await;
    assert!(cache.peek(RefKey::School).await.is_some());

    assert!(!cache.students().await.unwrap().is_cached());
    assert_eq!(backend.requests_to("students/all").len(), 2);
}

#[tokio::test]
async fn test_teacher_save_drops_class_list() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::GET,
        "classes/all",
        Reply::json(json!({"grade": [class(4, "Grade 4")]})),
    );
    backend.on(Method::GET, "schools/all", Reply::json(school()));
    backend.on(Method::POST, "teachers/post", Reply::json(json!({"id": 2})));

    let state = backend.state().await;
    state.cache().classes().await.unwrap();
    state.cache().school().await.unwrap();

    let mut modal = FormModal::create(Entity::Teacher);
    modal.open();
    modal.set("first_name", "Peter");
    modal.set("last_name", "Kamau");
    modal.set("phone", "+254712345678");
    let outcome = modal.submit(state.client(), state.cache()).await;
    assert!(outcome.needs_refetch(), "{outcome:?}");

    assert!(state.cache().peek(RefKey::Classes).await.is_none());
    assert!(state.cache().peek(RefKey::School).await.is_some());
    assert!(!state.cache().classes().await.unwrap().is_cached());
    assert_eq!(backend.requests_to("classes/all").len(), 2);
}

#[tokio::test]
async fn test_entries_expire_after_ttl() {
    let backend = FakeBackend::start().await;
    backend.on(Method::GET, "schools/all", Reply::json(school()));
    let cache = ReferenceCache::with_ttl(backend.client(), Duration::from_millis(100));

    cache.school().await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(!cache.school().await.unwrap().is_cached());
    assert_eq!(backend.requests_to("schools/all").len(), 2);
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let backend = FakeBackend::start().await;
    backend.on(Method::GET, "classes/all", Reply::error(500, "down"));
    let cache = ReferenceCache::new(backend.client());

    assert!(cache.classes().await.is_err());
    assert!(cache.peek(RefKey::Classes).await.is_none());

    backend.on(
        Method::GET,
        "classes/all",
        Reply::json(json!({"grade": [{"id": 4, "name": "Grade 4"}]})),
    );
    assert_eq!(cache.classes().await.unwrap().value.len(), 1);
}
