//! Client for the hosted identity service.
//!
//! Holds the access token of the signed-in viewer and resolves it to an
//! [`Identity`] through the service's `GET /auth/v1/user` endpoint. Sign-in
//! and sign-out are broadcast so the roster session can reload.

use domain::models::{Identity, IdentityChange};
use domain::services::IdentityProvider;
use domain::BackendError;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::AuthConfig;

const IDENTITY_CHANGE_BUFFER: usize = 16;

/// User object returned by the identity service.
#[derive(Debug, Deserialize)]
struct UserResponse {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<UserResponse> for Identity {
    fn from(user: UserResponse) -> Self {
        let display_name = user
            .user_metadata
            .full_name
            .or(user.user_metadata.name)
            .filter(|name| !name.trim().is_empty());
        Identity {
            id: user.id,
            email: user.email.unwrap_or_default(),
            display_name,
        }
    }
}

/// [`IdentityProvider`] backed by the hosted identity HTTP API.
pub struct HostedAuthClient {
    client: Client,
    user_url: String,
    api_key: String,
    access_token: RwLock<Option<String>>,
    changes: broadcast::Sender<IdentityChange>,
}

impl HostedAuthClient {
    pub fn new(config: &AuthConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        let (changes, _) = broadcast::channel(IDENTITY_CHANGE_BUFFER);

        Ok(Self {
            client,
            user_url: format!("{}/auth/v1/user", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            access_token: RwLock::new(None),
            changes,
        })
    }

    /// Adopt `token` as the viewer's session if the identity service accepts it.
    ///
    /// Returns `Ok(None)` when the token is rejected; the previous session is
    /// left untouched in that case.
    pub async fn sign_in(&self, token: &str) -> Result<Option<Identity>, BackendError> {
        let Some(identity) = self.fetch_user(token).await? else {
            tracing::info!("Identity service rejected access token");
            return Ok(None);
        };

        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        tracing::info!(identity_id = %identity.id, "Signed in");
        let _ = self.changes.send(IdentityChange::SignedIn(identity.clone()));

        Ok(Some(identity))
    }

    /// Forget the current session. Returns false when nobody was signed in.
    pub fn sign_out(&self) -> bool {
        let previous = self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_none() {
            return false;
        }
        tracing::info!("Signed out");
        let _ = self.changes.send(IdentityChange::SignedOut);
        true
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn fetch_user(&self, token: &str) -> Result<Option<Identity>, BackendError> {
        let response = self
            .client
            .get(&self.user_url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Request(format!(
                "identity service returned {}: {}",
                status, body
            )));
        }

        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Some(user.into()))
    }
}

fn request_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() || err.is_connect() {
        BackendError::Unavailable(err.to_string())
    } else {
        BackendError::Request(err.to_string())
    }
}

#[async_trait::async_trait]
impl IdentityProvider for HostedAuthClient {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        match self.token() {
            Some(token) => self.fetch_user(&token).await,
            None => Ok(None),
        }
    }

    fn identity_changes(&self) -> broadcast::Receiver<IdentityChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::get, Json, Router};
    use serde_json::json;

    const VALID_TOKEN: &str = "valid-token";
    const OWNER_ID: &str = "0b8e5a43-52a4-4c43-9d7c-1f3c7e5a2b10";

    async fn user_handler(headers: HeaderMap) -> Result<Json<serde_json::Value>, StatusCode> {
        if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("anon") {
            return Err(StatusCode::BAD_REQUEST);
        }
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some(value) if value == format!("Bearer {}", VALID_TOKEN) => Ok(Json(json!({
                "id": OWNER_ID,
                "email": "owner@example.com",
                "user_metadata": { "full_name": "Dana Owner" }
            }))),
            Some("Bearer broken") => Err(StatusCode::INTERNAL_SERVER_ERROR),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }

    async fn spawn_identity_service() -> String {
        let app = Router::new().route("/auth/v1/user", get(user_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn client_for(base_url: String) -> HostedAuthClient {
        HostedAuthClient::new(&AuthConfig {
            base_url,
            api_key: "anon".to_string(),
            request_timeout_ms: 2_000,
        })
        .unwrap()
    }

    #[test]
    fn test_user_url_trims_trailing_slash() {
        let client = client_for("https://project.example.co/".to_string());
        assert_eq!(client.user_url, "https://project.example.co/auth/v1/user");
    }

    #[test]
    fn test_user_response_into_identity() {
        let user: UserResponse = serde_json::from_value(json!({
            "id": OWNER_ID,
            "email": "owner@example.com",
            "user_metadata": { "name": "Dana" }
        }))
        .unwrap();
        let identity = Identity::from(user);
        assert_eq!(identity.id.to_string(), OWNER_ID);
        assert_eq!(identity.display_name.as_deref(), Some("Dana"));

        let bare: UserResponse = serde_json::from_value(json!({ "id": OWNER_ID })).unwrap();
        let identity = Identity::from(bare);
        assert_eq!(identity.email, "");
        assert_eq!(identity.display_name, None);
    }

    #[tokio::test]
    async fn test_signed_out_has_no_identity() {
        let client = client_for("http://127.0.0.1:9".to_string());
        assert!(!client.is_signed_in());
        assert_eq!(client.current_identity().await.unwrap(), None);
        assert!(!client.sign_out());
    }

    #[tokio::test]
    async fn test_sign_in_and_out_broadcasts_changes() {
        let client = client_for(spawn_identity_service().await);
        let mut changes = client.identity_changes();

        let identity = client.sign_in(VALID_TOKEN).await.unwrap().unwrap();
        assert_eq!(identity.label(), "Dana Owner");
        assert!(client.is_signed_in());
        assert_eq!(
            changes.recv().await.unwrap(),
            IdentityChange::SignedIn(identity.clone())
        );
        assert_eq!(client.current_identity().await.unwrap(), Some(identity));

        assert!(client.sign_out());
        assert_eq!(changes.recv().await.unwrap(), IdentityChange::SignedOut);
        assert_eq!(client.current_identity().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejected_token_keeps_previous_session() {
        let client = client_for(spawn_identity_service().await);
        client.sign_in(VALID_TOKEN).await.unwrap();

        assert_eq!(client.sign_in("expired").await.unwrap(), None);
        assert!(client.is_signed_in());
        assert!(client.current_identity().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_server_error_is_request_error() {
        let client = client_for(spawn_identity_service().await);
        let err = client.sign_in("broken").await.unwrap_err();
        assert!(matches!(err, BackendError::Request(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let client = client_for("http://127.0.0.1:9".to_string());
        let err = client.sign_in(VALID_TOKEN).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }
}
