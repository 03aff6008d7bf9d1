//! Remote resource client for the SchoolSoft backend API.
//!
//! Every dashboard screen talks to the backend through [`ApiClient`]. The
//! client knows nothing about tables or forms; it resolves an [`Endpoint`]
//! against the configured base URL, sends JSON, and parses JSON back.
//!
//! There is no retry and no backoff. A failed call is returned as an
//! [`ApiError`] and the calling view decides how to surface it.
//!
//! # Areas
//!
//! - [`resources`] - list, create, update and delete per entity
//! - [`reference`] - reference lists (`*/all`), counts and chart aggregates
//! - [`auth`] - login
//! - [`maintenance`] - database reset actions

pub mod auth;
pub mod maintenance;
pub mod reference;
pub mod resources;

pub use auth::{LoginRequest, LoginResponse};
pub use maintenance::MaintenanceAction;
pub use reference::NamedValue;
pub use resources::Entity;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or rejected session token.
    #[error("Unauthorized")]
    Unauthorized,

    /// The entity has no such endpoint (e.g. deleting the school record).
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// The configured base URL cannot have path segments appended.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Whether the failure came from the backend itself (5xx) or the transport.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A path relative to the API base URL plus ordered query parameters.
///
/// Path segments are percent-encoded individually, so a search term such as
/// `mary/ann` stays a single segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    /// Start an endpoint from a slash-separated static path such as `students/count`.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
            query: Vec::new(),
        }
    }

    /// Append a single (encoded) path segment.
    #[must_use]
    pub fn segment(mut self, segment: impl fmt::Display) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Append a query parameter. Order is preserved.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Decoded path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Query parameters in the order they will be sent.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Value of the first query parameter named `key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Resolve against a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if `base` cannot be a base URL.
    pub fn resolve(&self, base: &Url) -> Result<Url, ApiError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(base.to_string()))?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Backend API client.
///
/// Cheap to clone; clones share the HTTP connection pool and session token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot be a base or the HTTP client fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                token: RwLock::new(None),
            }),
        })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Attach (or clear) the bearer token sent with every request.
    pub async fn set_token(&self, token: Option<SecretString>) {
        *self.inner.token.write().await = token;
    }

    async fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.inner.token.read().await.as_ref() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Execute a GET request and parse the JSON body.
    #[instrument(skip(self), fields(path = %endpoint))]
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, ApiError> {
        let url = endpoint.resolve(&self.inner.base_url)?;
        let request = self.authorize(self.inner.client.get(url)).await;
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Execute a POST request with a JSON body.
    #[instrument(skip(self, body), fields(path = %endpoint))]
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        endpoint: &Endpoint,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = endpoint.resolve(&self.inner.base_url)?;
        let request = self.authorize(self.inner.client.post(url).json(body)).await;
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Execute a body-less POST whose response is plain text.
    #[instrument(skip(self), fields(path = %endpoint))]
    pub async fn post_for_text(&self, endpoint: &Endpoint) -> Result<String, ApiError> {
        let url = endpoint.resolve(&self.inner.base_url)?;
        let request = self.authorize(self.inner.client.post(url)).await;
        let response = request.send().await?;

        if response.status().is_success() {
            return Ok(response.text().await?);
        }

        Err(self.parse_error(response).await)
    }

    /// Execute a PATCH request with a JSON body.
    #[instrument(skip(self, body), fields(path = %endpoint))]
    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        endpoint: &Endpoint,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = endpoint.resolve(&self.inner.base_url)?;
        let request = self.authorize(self.inner.client.patch(url).json(body)).await;
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Execute a DELETE request.
    #[instrument(skip(self), fields(path = %endpoint))]
    pub async fn delete(&self, endpoint: &Endpoint) -> Result<(), ApiError> {
        let url = endpoint.resolve(&self.inner.base_url)?;
        let request = self.authorize(self.inner.client.delete(url)).await;
        let response = request.send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(self.parse_error(response).await)
    }

    /// Handle API response and parse JSON. An empty body parses as `null`.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
                b"null"
            } else {
                &bytes
            };
            return serde_json::from_slice(body)
                .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(self.parse_error(response).await)
    }

    /// Parse an error response.
    async fn parse_error(&self, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ApiError::RateLimited(retry_after);
        }

        if status == 401 || status == 403 {
            return ApiError::Unauthorized;
        }

        if status == 404 {
            return ApiError::NotFound(response.url().path().to_string());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::debug!(status, %message, "API request failed");
        ApiError::Api { status, message }
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
