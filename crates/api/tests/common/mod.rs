//! Common test utilities for integration tests.
//!
//! The router runs against the in-memory backend, so no database or hosted
//! identity service is needed. A stub identity endpoint can be spawned for
//! sign-in flows.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    routing::get,
    Json, Router,
};
use domain::models::Identity;
use domain::services::{InMemoryBackend, RosterSession, RosterSettings, SessionBackends};
use safe_circle_api::{
    app::{create_app, AppState},
    config::{
        AuthConfig, Config, DatabaseConfig, LoggingConfig, RosterConfig, SecurityConfig,
        ServerConfig,
    },
    services::{HostedAuthClient, InboxNotifier},
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Token the stub identity service accepts.
pub const VALID_TOKEN: &str = "test-access-token";

/// Test configuration; the database section is never used.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Use random port
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
            run_migrations: false,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
        },
        auth: AuthConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "test-anon-key".to_string(),
            request_timeout_ms: 2_000,
        },
        roster: RosterConfig::default(),
    }
}

/// A running app wired to an in-memory backend.
pub struct TestApp {
    pub app: Router,
    pub backend: Arc<InMemoryBackend>,
    pub session: Arc<RosterSession>,
    pub inbox: Arc<InboxNotifier>,
}

impl TestApp {
    /// App whose identity comes straight from the in-memory backend; the
    /// session endpoints are unconfigured.
    pub async fn start() -> Self {
        Self::build(None).await
    }

    /// App whose identity is resolved through the hosted identity client
    /// pointed at `auth_base_url`.
    pub async fn start_with_auth(auth_base_url: String) -> (Self, Arc<HostedAuthClient>) {
        let mut config = test_config();
        config.auth.base_url = auth_base_url;
        let auth = Arc::new(HostedAuthClient::new(&config.auth).unwrap());
        (Self::build(Some(auth.clone())).await, auth)
    }

    async fn build(auth: Option<Arc<HostedAuthClient>>) -> Self {
        let config = test_config();
        let backend = Arc::new(InMemoryBackend::new());
        let inbox = Arc::new(InboxNotifier::new(config.roster.inbox_capacity));

        let identity: Arc<dyn domain::services::IdentityProvider> = match &auth {
            Some(auth) => auth.clone(),
            None => backend.clone(),
        };
        let backends = SessionBackends {
            identity,
            source: backend.clone(),
            feed: backend.clone(),
            notifier: inbox.clone(),
        };
        let settings = RosterSettings {
            load_timeout: Duration::from_secs(5),
            auth_retry_delay: Duration::from_millis(50),
            ..config.roster_settings()
        };
        let session = Arc::new(RosterSession::new(backends, settings));
        let _ = session.start();

        let state = AppState {
            config: Arc::new(config),
            session: session.clone(),
            auth,
            inbox: inbox.clone(),
            pool: None,
        };

        let test_app = Self {
            app: create_app(state),
            backend,
            session,
            inbox,
        };
        test_app.wait_for_first_load().await;
        test_app
    }

    async fn wait_for_first_load(&self) {
        let session = self.session.clone();
        wait_until(move || session.snapshot().has_loaded).await;
    }
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met within 5s");
}

/// Signed-in identity with a display name.
pub fn test_identity() -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: format!("owner_{}@example.com", Uuid::new_v4()),
        display_name: Some("Test Owner".to_string()),
    }
}

/// Spawns a stub identity service that accepts [`VALID_TOKEN`] as `owner`.
///
/// Returns its base URL.
pub async fn spawn_identity_service(owner: Identity) -> String {
    let app = Router::new().route(
        "/auth/v1/user",
        get(move |headers: HeaderMap| {
            let owner = owner.clone();
            async move {
                let expected = format!("Bearer {}", VALID_TOKEN);
                match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
                    Some(value) if value == expected => Ok(Json(serde_json::json!({
                        "id": owner.id,
                        "email": owner.email,
                        "user_metadata": { "full_name": owner.display_name },
                    }))),
                    _ => Err(StatusCode::UNAUTHORIZED),
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a request without a body.
pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a request carrying a bearer token.
pub fn request_with_bearer(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Parse response body as JSON.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// Read response body as text.
pub async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).into_owned()
}
