use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::{RosterSession, SessionBackends};
use persistence::{PgRosterSource, PgStatusFeed};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, position, roster, session};
use crate::services::{HostedAuthClient, InboxNotifier};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: Arc<RosterSession>,
    /// Hosted identity client; `None` when identities are managed elsewhere.
    pub auth: Option<Arc<HostedAuthClient>>,
    pub inbox: Arc<InboxNotifier>,
    /// `None` when the roster runs on a non-database backend.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Wires the Postgres adapters and the hosted identity client into a
    /// roster session. The session is created but not started.
    pub fn connect(config: Config, pool: PgPool) -> Result<Self, reqwest::Error> {
        let auth = Arc::new(HostedAuthClient::new(&config.auth)?);
        let inbox = Arc::new(InboxNotifier::new(config.roster.inbox_capacity));

        let backends = SessionBackends {
            identity: auth.clone(),
            source: Arc::new(PgRosterSource::new(pool.clone())),
            feed: Arc::new(PgStatusFeed::new(
                pool.clone(),
                config.roster.feed_channel.clone(),
            )),
            notifier: inbox.clone(),
        };
        let session = Arc::new(RosterSession::new(backends, config.roster_settings()));

        Ok(Self {
            config: Arc::new(config),
            session,
            auth: Some(auth),
            inbox,
            pool: Some(pool),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let roster_routes = Router::new()
        .route("/api/v1/roster", get(roster::get_roster))
        .route("/api/v1/roster/retry", post(roster::retry_roster))
        .route(
            "/api/v1/roster/notifications",
            get(roster::drain_notifications),
        )
        .route("/api/v1/position", put(position::update_position))
        .route(
            "/api/v1/session",
            put(session::sign_in).delete(session::sign_out),
        );

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(roster_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
