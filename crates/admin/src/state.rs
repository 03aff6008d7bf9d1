//! Application state shared by every screen.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use schoolsoft_core::Email;
use secrecy::{ExposeSecret, SecretString};

use crate::api::{ApiClient, LoginRequest};
use crate::cache::ReferenceCache;
use crate::config::AdminConfig;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::forms::{FormValues, login_schema};
use crate::session::{FileStore, KeyValueStore, Session, SessionContext, SessionError};

/// Configuration, API client, reference cache and session, behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    client: ApiClient,
    cache: ReferenceCache,
    session: SessionContext,
}

impl AppState {
    /// Build state with the on-disk session store from `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the HTTP client cannot be built or the stored
    /// session cannot be read.
    pub async fn from_config(config: AdminConfig) -> Result<Self, AppError> {
        let client = ApiClient::new(config.api_base_url.clone(), config.http_timeout)?;
        let store = Arc::new(FileStore::new(config.storage_path()));
        Self::with_store(config, client, store, Utc::now()).await
    }

    /// Build state over an explicit client and store.
    ///
    /// A session still active at `now` has its token attached to the client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the store cannot be read.
    pub async fn with_store(
        config: AdminConfig,
        client: ApiClient,
        store: Arc<dyn KeyValueStore>,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let session = SessionContext::new(store);
        let cache = ReferenceCache::new(client.clone());

        if let Some(current) = session.read()?
            && !current.is_expired_at(now)
        {
            client.set_token(Some(current.token.clone())).await;
            set_sentry_user(current.user_id, Some(&current.email));
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                client,
                cache,
                session,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    #[must_use]
    pub fn cache(&self) -> &ReferenceCache {
        &self.inner.cache
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    /// Validate credentials, log in, and persist the session.
    ///
    /// Invalid input is rejected before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for bad input, `AppError::Api` if the
    /// backend refuses the login, or `AppError::Session` if it cannot be stored.
    pub async fn login(
        &self,
        email: &str,
        password: SecretString,
        now: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let values = FormValues::from([
            ("email".to_string(), email.to_string()),
            ("password".to_string(), password.expose_secret().to_string()),
        ]);
        login_schema().validate(&values)?;

        let email = Email::parse(email.trim()).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let response = self
            .inner
            .client
            .login(&LoginRequest { email, password })
            .await?;

        let session = self.inner.session.sign_in(response, now)?;
        self.inner
            .client
            .set_token(Some(session.token.clone()))
            .await;
        set_sentry_user(session.user_id, Some(&session.email));
        Ok(session)
    }

    /// Forget the session, its token, and every cached reference list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the stored session cannot be removed.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.inner.session.sign_out()?;
        self.inner.client.set_token(None).await;
        self.inner.cache.clear().await;
        clear_sentry_user();
        tracing::info!("Signed out");
        Ok(())
    }

    /// The active session, or an error that sends the user back to login.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if no session is stored or it has expired.
    pub async fn require_session(&self, now: DateTime<Utc>) -> Result<Session, AppError> {
        match self.inner.session.require_active(now) {
            Ok(session) => Ok(session),
            Err(e) => {
                if matches!(e, SessionError::Expired) {
                    self.inner.client.set_token(None).await;
                    clear_sentry_user();
                }
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api_base_url", &self.inner.config.api_base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::MemoryStore;

    fn config() -> AdminConfig {
        AdminConfig::from_lookup(|key| match key {
            "SCHOOLSOFT_API_URL" => Some("http://127.0.0.1:9/api".to_string()),
            _ => None,
        })
        .unwrap()
    }

    async fn state() -> AppState {
        let config = config();
        let client = ApiClient::new(config.api_base_url.clone(), Duration::from_millis(100)).unwrap();
        AppState::with_store(config, client, Arc::new(MemoryStore::new()), Utc::now())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_rejects_invalid_input_locally() {
        let state = state().await;
        let err = state
            .login("not-an-email", SecretString::from(""), Utc::now())
            .await
            .unwrap_err();

        let errors = match err {
            AppError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }

    #[tokio::test]
    async fn test_require_session_without_login() {
        let state = state().await;
        let err = state.require_session(Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Session(SessionError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let state = state().await;
        state.logout().await.unwrap();
        state.logout().await.unwrap();
        assert!(!state.session().is_authenticated(Utc::now()));
    }
}
