//! Integration tests for SchoolSoft.
//!
//! Tests run the dashboard library against [`FakeBackend`], an in-process
//! axum server on an ephemeral port. Every request it receives is recorded,
//! and replies are looked up by method and path in a table the test fills in
//! (and may change while the server is running). Unknown routes answer 404.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p schoolsoft-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = FakeBackend::start().await;
//! backend.on(Method::GET, "students/count", Reply::json(json!({"totalStudents": 3})));
//!
//! let count = backend.client().student_count().await?;
//! assert_eq!(count, 3);
//! assert_eq!(backend.requests_to("students/count").len(), 1);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use schoolsoft_admin::api::ApiClient;
use schoolsoft_admin::config::AdminConfig;
use schoolsoft_admin::session::{KeyValueStore, MemoryStore};
use schoolsoft_admin::state::AppState;
use serde_json::Value;
use url::Url;

/// Path prefix the fake backend serves under.
pub const API_PREFIX: &str = "/api/";

/// One canned reply.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: ReplyBody,
    delay: Option<Duration>,
}

#[derive(Debug, Clone)]
enum ReplyBody {
    Json(Value),
    Text(String),
}

impl Reply {
    /// `200 OK` with a JSON body.
    #[must_use]
    pub const fn json(value: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Json(value),
            delay: None,
        }
    }

    /// `200 OK` with a plain-text body.
    #[must_use]
    pub fn text(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Text(body.to_string()),
            delay: None,
        }
    }

    /// An error status with a plain-text body.
    #[must_use]
    pub fn error(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: ReplyBody::Text(body.to_string()),
            delay: None,
        }
    }

    /// Hold the reply back for `delay`.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            ReplyBody::Json(value) => (self.status, axum::Json(value)).into_response(),
            ReplyBody::Text(text) => (self.status, text).into_response(),
        }
    }
}

/// A request as the fake backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path below [`API_PREFIX`], still percent-encoded.
    pub path: String,
    /// Decoded query pairs in the order sent.
    pub query: Vec<(String, String)>,
    /// JSON body, if one was sent.
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    /// First decoded value of query parameter `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Query parameter names in the order sent.
    #[must_use]
    pub fn query_keys(&self) -> Vec<&str> {
        self.query.iter().map(|(k, _)| k.as_str()).collect()
    }
}

#[derive(Default)]
struct Shared {
    routes: Mutex<HashMap<(Method, String), Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process HTTP backend with canned replies.
#[derive(Clone)]
pub struct FakeBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener
            .local_addr()
            .expect("Fake backend has no local address");

        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&shared));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, shared }
    }

    /// Set (or replace) the reply for `method` on `path` (relative to the API prefix).
    pub fn on(&self, method: Method, path: &str, reply: Reply) {
        self.shared
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((method, path.to_string()), reply);
    }

    /// Remove the reply for `method` on `path`; it will answer 404 again.
    pub fn off(&self, method: &Method, path: &str) {
        self.shared
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(method.clone(), path.to_string()));
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for one path.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Base URL to configure the client with.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}{API_PREFIX}", self.addr)).expect("Invalid fake backend URL")
    }

    /// A client pointed at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url(), Duration::from_secs(5)).expect("Failed to build client")
    }

    /// Configuration pointed at this backend with a throwaway state directory.
    ///
    /// # Panics
    ///
    /// Panics if the configuration does not load.
    #[must_use]
    pub fn config(&self) -> AdminConfig {
        let base_url = self.base_url().to_string();
        let state_dir = scratch_dir();
        AdminConfig::from_lookup(|key| match key {
            "SCHOOLSOFT_API_URL" => Some(base_url.clone()),
            "SCHOOLSOFT_STATE_DIR" => Some(state_dir.display().to_string()),
            _ => None,
        })
        .expect("Failed to build test config")
    }

    /// Application state over an in-memory session store.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be built.
    pub async fn state(&self) -> AppState {
        self.state_with_store(Arc::new(MemoryStore::new()), Utc::now())
            .await
    }

    /// Application state over `store`, as if started at `now`.
    ///
    /// # Panics
    ///
    /// Panics if the state cannot be built.
    pub async fn state_with_store(
        &self,
        store: Arc<dyn KeyValueStore>,
        now: DateTime<Utc>,
    ) -> AppState {
        AppState::with_store(self.config(), self.client(), store, now)
            .await
            .expect("Failed to build app state")
    }
}

/// A fresh directory path under the system temp dir. Not created.
#[must_use]
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("schoolsoft-test-{}", uuid::Uuid::new_v4()))
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or_else(|| uri.path())
        .to_string();
    let query = uri
        .query()
        .map(|raw| {
            url::form_urlencoded::parse(raw.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_slice(&body).ok();

    shared
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query,
            body,
            authorization,
        });

    let reply = shared
        .routes
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&(method, path))
        .cloned();

    match reply {
        Some(reply) => {
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            reply.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// JSON bodies shaped like the backend's.
pub mod fixtures {
    use serde_json::{Value, json};

    /// A list envelope.
    #[must_use]
    pub fn envelope(items: Vec<Value>, total_pages: u64, items_per_page: u64) -> Value {
        json!({
            "items": items,
            "totalPages": total_pages,
            "itemsPerPage": items_per_page,
        })
    }

    #[must_use]
    pub fn student(id: i32, first_name: &str, last_name: &str, class_id: i32, balance: i64) -> Value {
        json!({
            "id": id,
            "first_name": first_name,
            "last_name": last_name,
            "dob": "2014-02-11",
            "gender": "FEMALE",
            "guardianName": "Mary Otieno",
            "guardianPhone": "0712345678",
            "classId": class_id,
            "Class": { "id": class_id, "name": "Grade 4" },
            "feeAmount": 45000,
            "feeBalance": balance,
        })
    }

    #[must_use]
    pub fn class(id: i32, name: &str) -> Value {
        json!({ "id": id, "name": name, "teacherId": null })
    }

    #[must_use]
    pub fn payment(id: i32, student_id: i32, class_id: i32, amount: i64) -> Value {
        json!({
            "id": id,
            "studentId": student_id,
            "classId": class_id,
            "amount": amount,
            "payment_mode": "MPESA",
            "reference": "QWE123RTY",
            "createdAt": "2024-03-05T11:03:09.000Z",
        })
    }

    #[must_use]
    pub fn school() -> Value {
        json!({
            "id": 1,
            "name": "Hillside Academy",
            "email": "office@hillside.ac.ke",
            "phone": "0712345678",
            "phone2": "0733000111",
            "address": "P.O. Box 100",
            "address2": "Kisumu Road",
            "town": "Kisumu",
            "mpesaInfo": "Paybill 400200",
            "bankName": "KCB",
            "bankAcc": "1100223344",
            "school_motto": "Strive to excel",
        })
    }

    #[must_use]
    pub fn login_response() -> Value {
        json!({
            "token": "abc.def.ghi",
            "role": "ADMIN",
            "userId": 3,
            "name": "Jane Wanjiru",
            "email": "jane@hillside.ac.ke",
        })
    }
}
