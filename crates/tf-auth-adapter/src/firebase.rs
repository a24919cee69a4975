use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{AuthState, AuthenticatedUser, IdentityError, IdentityProvider, normalize_email};

pub const FIREBASE_API_KEY_ENV: &str = "FIREBASE_API_KEY";
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Firebase Authentication through the Identity Toolkit REST API.
///
/// Sign-out only drops the local user; Firebase ID tokens expire on their own.
pub struct FirebaseIdentityProvider {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
    state: AuthState,
}

impl FirebaseIdentityProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, IDENTITY_TOOLKIT_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            http: reqwest::Client::new(),
            state: AuthState::default(),
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var(FIREBASE_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    async fn password_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, String> {
        let url = format!("{}/accounts:{endpoint}?key={}", self.base_url, self.api_key);
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| format!("transport: {err}"))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(serde_json::from_str::<FirebaseErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}: {text}")));
        }

        let parsed: PasswordResponse =
            serde_json::from_str(&text).map_err(|err| format!("parse: {err}"))?;

        Ok(AuthenticatedUser {
            user_id: parsed.local_id,
            email: parsed.email.unwrap_or_else(|| email.to_owned()),
            id_token: Some(parsed.id_token),
        })
    }
}

// ── Identity Toolkit REST types ─────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorEnvelope {
    error: FirebaseError,
}

#[derive(Debug, Deserialize)]
struct FirebaseError {
    message: String,
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthenticatedUser, IdentityError> {
        let email = normalize_email(email);
        match self.password_request("signUp", &email, password).await {
            Ok(user) => {
                info!(user_id = %user.user_id, "firebase account created");
                self.state.set(Some(user.clone()));
                Ok(user)
            }
            Err(reason) => {
                warn!(%email, %reason, "firebase signUp failed");
                Err(IdentityError::SignUpFailed { reason })
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthenticatedUser, IdentityError> {
        let email = normalize_email(email);
        match self.password_request("signInWithPassword", &email, password).await {
            Ok(user) => {
                info!(user_id = %user.user_id, "firebase sign-in");
                self.state.set(Some(user.clone()));
                Ok(user)
            }
            Err(reason) => {
                warn!(%email, %reason, "firebase signInWithPassword failed");
                Err(IdentityError::SignInFailed { reason })
            }
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.state.set(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthenticatedUser> {
        self.state.current()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthenticatedUser>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_identity_toolkit_names() {
        let body = PasswordRequest {
            email: "ada@example.com",
            password: "hunter22",
            return_secure_token: true,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["returnSecureToken"], true);
        assert_eq!(value["email"], "ada@example.com");
    }

    #[test]
    fn error_envelope_exposes_code() {
        let envelope: FirebaseErrorEnvelope = serde_json::from_str(
            r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#,
        )
        .unwrap();
        assert_eq!(envelope.error.message, "EMAIL_EXISTS");
    }

    #[test]
    fn base_url_normalized() {
        let provider = FirebaseIdentityProvider::with_base_url("key", "http://localhost:9099/identitytoolkit.googleapis.com/v1/");
        assert_eq!(provider.base_url, "http://localhost:9099/identitytoolkit.googleapis.com/v1");
        assert_eq!(provider.current_user(), None);
    }

    use axum::{Json, Router, http::StatusCode, http::Uri};
    use serde_json::{Value, json};

    /// Identity Toolkit stand-in: `ada@example.com` already exists and signs
    /// in with `hunter22`.
    async fn identity_toolkit(uri: Uri, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let email = body["email"].as_str().unwrap_or_default();
        let rejected = |message: &str| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "code": 400, "message": message, "errors": [] } })),
            )
        };
        match uri.path() {
            "/v1/accounts:signUp" if email == "ada@example.com" => rejected("EMAIL_EXISTS"),
            "/v1/accounts:signUp" => (
                StatusCode::OK,
                Json(json!({ "localId": "uid-new", "email": email, "idToken": "token-new" })),
            ),
            "/v1/accounts:signInWithPassword" if body["password"] == "hunter22" => (
                StatusCode::OK,
                Json(json!({ "localId": "uid-ada", "email": email, "idToken": "token-ada" })),
            ),
            "/v1/accounts:signInWithPassword" => rejected("INVALID_LOGIN_CREDENTIALS"),
            _ => (StatusCode::NOT_FOUND, Json(json!({}))),
        }
    }

    async fn serve_identity_toolkit() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new().fallback(identity_toolkit);
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn existing_email_is_a_sign_up_failure() {
        let provider = FirebaseIdentityProvider::with_base_url("key", &serve_identity_toolkit().await);
        let err = provider
            .create_account("Ada@Example.com", "hunter22")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::SignUpFailed { .. }));
        assert_eq!(err.reason(), "EMAIL_EXISTS");
        assert_eq!(err.to_string(), "failed to create account, please try again");
        assert_eq!(provider.current_user(), None);
    }

    #[tokio::test]
    async fn sign_in_publishes_the_user() {
        let provider = FirebaseIdentityProvider::with_base_url("key", &serve_identity_toolkit().await);
        let feed = provider.subscribe();

        let user = provider.sign_in("ada@example.com", "hunter22").await.unwrap();
        assert_eq!(user.user_id, "uid-ada");
        assert_eq!(user.id_token.as_deref(), Some("token-ada"));
        assert_eq!(feed.borrow().as_ref().map(|u| u.user_id.as_str()), Some("uid-ada"));

        let err = provider.sign_in("ada@example.com", "nope").await.unwrap_err();
        assert_eq!(err.reason(), "INVALID_LOGIN_CREDENTIALS");
        assert_eq!(err.to_string(), "invalid email or password, please try again");

        provider.sign_out().await.unwrap();
        assert!(feed.borrow().is_none());
    }

    #[tokio::test]
    async fn unreachable_service_is_reported_with_the_fixed_message() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider = FirebaseIdentityProvider::with_base_url("key", &format!("http://{addr}/v1"));
        let err = provider.create_account("new@example.com", "hunter22").await.unwrap_err();
        assert!(err.reason().starts_with("transport"));
        assert_eq!(err.to_string(), "failed to create account, please try again");
    }
}
