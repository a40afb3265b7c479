//! Dockline API server library

pub mod config;
mod db;
mod engine;
pub mod error;
mod middleware;
pub mod response;
mod routes;

use axum::extract::FromRef;
use axum::{Router, middleware as axum_middleware};
use chrono_tz::Tz;
use dockline_core::models::Profile;
use dockline_telegram::TelegramGateway;
use moka::future::Cache;
use sqlx::PgPool;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::bearer_auth::bearer_auth;
use crate::middleware::rate_limit::{
    API_BURST_SIZE, API_PERIOD_MS, PUBLIC_BURST_SIZE, PUBLIC_PERIOD_MS, ProfileOrIpKeyExtractor,
    WEBHOOK_BURST_SIZE, WEBHOOK_PERIOD_MS,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub gateway: TelegramGateway,
    /// Telegram id to profile, identity only. Authorization stays uncached.
    pub profile_cache: Cache<i64, Profile>,
    pub access_token_secret: String,
    pub charter_timezone: Tz,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

/// Create the application router
pub fn create_router(state: AppState, cors_origin: &str) -> Router {
    let cors = if cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        match cors_origin.parse::<axum::http::HeaderValue>() {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(e) => {
                // Startup configuration, fail loudly
                panic!("Invalid CORS origin '{}': {}", cors_origin, e);
            }
        }
    };

    let public_api = routes::bookings::public_routes()
        .merge(routes::trips::public_routes())
        .layer(GovernorLayer::new(
            GovernorConfigBuilder::default()
                .period(std::time::Duration::from_millis(PUBLIC_PERIOD_MS))
                .burst_size(PUBLIC_BURST_SIZE)
                .key_extractor(ProfileOrIpKeyExtractor)
                .finish()
                .expect("Failed to create public governor config"),
        ));

    // The governor is layered under auth so it sees the profile id the
    // auth middleware inserts; keys fall back to IP only before auth
    let protected_api = routes::bookings::protected_routes()
        .merge(routes::trips::protected_routes())
        .layer(GovernorLayer::new(
            GovernorConfigBuilder::default()
                .period(std::time::Duration::from_millis(API_PERIOD_MS))
                .burst_size(API_BURST_SIZE)
                .key_extractor(ProfileOrIpKeyExtractor)
                .finish()
                .expect("Failed to create API governor config"),
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            bearer_auth,
        ));

    Router::new()
        .merge(routes::health::routes())
        .nest("/api", public_api.merge(protected_api))
        .nest(
            "/telegram",
            routes::telegram::routes().layer(GovernorLayer::new(
                GovernorConfigBuilder::default()
                    .period(std::time::Duration::from_millis(WEBHOOK_PERIOD_MS))
                    .burst_size(WEBHOOK_BURST_SIZE)
                    .key_extractor(ProfileOrIpKeyExtractor)
                    .finish()
                    .expect("Failed to create webhook governor config"),
            )),
        )
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let remote_addr = request
                        .extensions()
                        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
                        .map(|ci| ci.0.to_string())
                        .unwrap_or_else(|| "unknown".into());

                    let user_agent = request
                        .headers()
                        .get(axum::http::header::USER_AGENT)
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("unknown");

                    let forwarded_for = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|h| h.to_str().ok());

                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                        remote_addr = %remote_addr,
                        forwarded_for = ?forwarded_for,
                        user_agent = %user_agent,
                    )
                })
                .on_request(|_request: &axum::http::Request<_>, _span: &tracing::Span| {
                    tracing::info!("started processing request");
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %response.status(),
                            "finished processing request"
                        );
                    },
                ),
        )
        .with_state(state)
}

/// Run the API server
///
/// Builds the router and blocks until the listener exits.
pub async fn run_api(state: AppState, config: &config::Config) -> Result<(), std::io::Error> {
    let app = create_router(state, &config.cors_allowed_origin);
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
}
