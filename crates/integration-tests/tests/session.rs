//! Login, session persistence and expiry.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::http::Method;
use chrono::{Duration, Utc};
use schoolsoft_admin::AppError;
use schoolsoft_admin::api::ApiError;
use schoolsoft_admin::session::{
    FileStore, KeyValueStore, MemoryStore, SESSION_KEY, SESSION_LIFETIME_MS, SessionError,
};
use schoolsoft_core::{Role, UserId};
use schoolsoft_integration_tests::fixtures::login_response;
use schoolsoft_integration_tests::{FakeBackend, Reply, scratch_dir};
use secrecy::SecretString;
use serde_json::{Value, json};

fn password(raw: &str) -> SecretString {
    SecretString::from(raw.to_string())
}

#[tokio::test]
async fn test_login_stores_session_and_sends_bearer_token() {
    let backend = FakeBackend::start().await;
    backend.on(Method::POST, "login", Reply::json(login_response()));
    backend.on(
        Method::GET,
        "students/count",
        Reply::json(json!({"totalStudents": "42"})),
    );

    let store = Arc::new(MemoryStore::new());
    let state = backend.state_with_store(store.clone(), Utc::now()).await;
    let now = Utc::now();

    let session = state
        .login(" jane@hillside.ac.ke ", password("hunter2"), now)
        .await
        .unwrap();
    assert_eq!(session.name, "Jane Wanjiru");
    assert_eq!(session.role, Some(Role::Admin));
    assert_eq!(session.user_id, UserId::new(3));
    assert_eq!(
        session.expires_at,
        now.timestamp_millis() + SESSION_LIFETIME_MS
    );

    let login = &backend.requests_to("login")[0];
    assert_eq!(
        login.body,
        Some(json!({"email": "jane@hillside.ac.ke", "password": "hunter2"}))
    );
    assert!(login.authorization.is_none());

    let raw = store.get(SESSION_KEY).unwrap().unwrap();
    let stored: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["authenticated"], true);
    assert_eq!(stored["token"], "abc.def.ghi");
    assert_eq!(stored["userId"], 3);

    assert_eq!(state.client().student_count().await.unwrap(), 42);
    let count = &backend.requests_to("students/count")[0];
    assert_eq!(count.authorization.as_deref(), Some("Bearer abc.def.ghi"));
}

#[tokio::test]
async fn test_rejected_login_stores_nothing() {
    let backend = FakeBackend::start().await;
    backend.on(Method::POST, "login", Reply::error(401, "Invalid credentials"));

    let store = Arc::new(MemoryStore::new());
    let state = backend.state_with_store(store.clone(), Utc::now()).await;

    let err = state
        .login("jane@hillside.ac.ke", password("wrong"), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Api(ApiError::Unauthorized)));
    assert!(store.get(SESSION_KEY).unwrap().is_none());
    assert!(!state.session().is_authenticated(Utc::now()));
}

#[tokio::test]
async fn test_session_survives_restart_through_file_store() {
    let backend = FakeBackend::start().await;
    backend.on(Method::POST, "login", Reply::json(login_response()));
    backend.on(
        Method::GET,
        "classes/count",
        Reply::json(json!({"totalClasses": 6})),
    );

    let path = scratch_dir().join("storage.json");
    let first = backend
        .state_with_store(Arc::new(FileStore::new(&path)), Utc::now())
        .await;
    first
        .login("jane@hillside.ac.ke", password("hunter2"), Utc::now())
        .await
        .unwrap();

    let second = backend
        .state_with_store(Arc::new(FileStore::new(&path)), Utc::now())
        .await;
    let session = second.require_session(Utc::now()).await.unwrap();
    assert_eq!(session.email, "jane@hillside.ac.ke");

    assert_eq!(second.client().class_count().await.unwrap(), 6);
    let request = &backend.requests_to("classes/count")[0];
    assert_eq!(request.authorization.as_deref(), Some("Bearer abc.def.ghi"));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn test_expired_session_is_cleared() {
    let backend = FakeBackend::start().await;
    backend.on(Method::POST, "login", Reply::json(login_response()));
    backend.on(
        Method::GET,
        "teachers/count",
        Reply::json(json!({"totalTeachers": 2})),
    );

    let store = Arc::new(MemoryStore::new());
    let logged_in_at = Utc::now() - Duration::hours(2);
    let state = backend.state_with_store(store.clone(), Utc::now()).await;
    state
        .login("jane@hillside.ac.ke", password("hunter2"), logged_in_at)
        .await
        .unwrap();

    let err = state.require_session(Utc::now()).await.unwrap_err();
    assert!(matches!(err, AppError::Session(SessionError::Expired)));
    assert!(store.get(SESSION_KEY).unwrap().is_none());

    state.client().teacher_count().await.unwrap();
    let request = &backend.requests_to("teachers/count")[0];
    assert!(request.authorization.is_none());

    let err = state.require_session(Utc::now()).await.unwrap_err();
    assert!(matches!(err, AppError::Session(SessionError::NotSignedIn)));
}

#[tokio::test]
async fn test_session_inside_expiry_margin_counts_as_expired() {
    let backend = FakeBackend::start().await;
    backend.on(Method::POST, "login", Reply::json(login_response()));

    let state = backend.state().await;
    let now = Utc::now();
    state
        .login("jane@hillside.ac.ke", password("hunter2"), now)
        .await
        .unwrap();

    let almost_over = now + Duration::milliseconds(SESSION_LIFETIME_MS - 5_000);
    assert!(!state.session().is_authenticated(almost_over));
}

#[tokio::test]
async fn test_expired_session_not_attached_on_startup() {
    let backend = FakeBackend::start().await;
    backend.on(
        Method::GET,
        "students/count",
        Reply::json(json!({"totalStudents": 1})),
    );

    let store = Arc::new(MemoryStore::new());
    let expired = json!({
        "authenticated": true,
        "token": "stale",
        "role": "USER",
        "userId": 8,
        "name": "Old Session",
        "email": "old@hillside.ac.ke",
        "expiresAt": (Utc::now() - Duration::minutes(5)).timestamp_millis(),
    });
    store.set(SESSION_KEY, &expired.to_string()).unwrap();

    let state = backend.state_with_store(store, Utc::now()).await;
    state.client().student_count().await.unwrap();
    assert!(backend.requests_to("students/count")[0].authorization.is_none());
}

#[tokio::test]
async fn test_logout_clears_session_token_and_cache() {
    let backend = FakeBackend::start().await;
    backend.on(Method::POST, "login", Reply::json(login_response()));
    backend.on(
        Method::GET,
        "classes/all",
        Reply::json(json!({"grade": [{"id": 4, "name": "Grade 4"}]})),
    );

    let store = Arc::new(MemoryStore::new());
    let state = backend.state_with_store(store.clone(), Utc::now()).await;
    state
        .login("jane@hillside.ac.ke", password("hunter2"), Utc::now())
        .await
        .unwrap();
    state.cache().classes().await.unwrap();

    state.logout().await.unwrap();
    assert!(store.get(SESSION_KEY).unwrap().is_none());

    let lookup = state.cache().classes().await.unwrap();
    assert!(!lookup.is_cached());
    let requests = backend.requests_to("classes/all");
    assert_eq!(requests.len(), 2);
    assert!(requests[1].authorization.is_none());
}
