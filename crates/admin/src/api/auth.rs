//! Login against the backend.

use std::fmt;

use schoolsoft_core::{Email, Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::instrument;

use super::{ApiClient, ApiError, Endpoint};

/// Credentials posted to `login`.
pub struct LoginRequest {
    pub email: Email,
    pub password: SecretString,
}

impl Serialize for LoginRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LoginRequest", 2)?;
        state.serialize_field("email", self.email.as_str())?;
        state.serialize_field("password", self.password.expose_secret())?;
        state.end()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful login payload.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub role: Option<Role>,
    pub user_id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for rejected credentials, or another
    /// `ApiError` if the request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post(&Endpoint::new("login"), request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request() -> LoginRequest {
        LoginRequest {
            email: Email::parse("bursar@school.ke").unwrap(),
            password: SecretString::from("hunter2".to_string()),
        }
    }

    #[test]
    fn test_request_body_exposes_password_only_on_the_wire() {
        let body = serde_json::to_value(request()).unwrap();
        assert_eq!(body, json!({"email": "bursar@school.ke", "password": "hunter2"}));
        assert!(!format!("{:?}", request()).contains("hunter2"));
    }

    #[test]
    fn test_response_parse() {
        let response: LoginResponse = serde_json::from_value(json!({
            "token": "abc.def",
            "role": "ADMIN",
            "userId": 3,
            "name": "Jane Wanjiru",
            "email": "jane@school.ke"
        }))
        .unwrap();
        assert_eq!(response.role, Some(Role::Admin));
        assert_eq!(response.user_id, UserId::new(3));
        assert!(!format!("{response:?}").contains("abc.def"));
    }
}
