//! Scanner Log API
//!
//! Inventory tracking backend: users authenticate with bearer tokens, manage
//! inventory items, and receive low-stock notifications when an item's quantity
//! reaches its minimum.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::auth::{AuthConfig, AuthRouterExt, AuthService};
use crate::services::PageLimits;
pub use crate::handlers::AppServices;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: AppServices,
}

impl AppState {
    /// Wires the services against `db` using the token and paging settings
    /// from `config`.
    pub fn from_config(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
    ) -> Result<Self, config::AppConfigError> {
        let auth = Arc::new(AuthService::new(AuthConfig::new(
            config.signing_secret()?,
            chrono::Duration::minutes(config.access_token_expire_minutes),
        )));
        let limits = PageLimits::new(config.api_default_page_size, config.api_max_page_size);
        let services = AppServices::new(db.clone(), auth, limits);

        Ok(Self {
            db,
            config,
            services,
        })
    }
}

/// Routes that require an authenticated, active user
pub fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/me", get(handlers::auth::me))
        .route("/protected-healthz", get(handlers::health::protected_healthz))
        .route(
            "/items",
            post(handlers::items::create_item).get(handlers::items::list_items),
        )
        .route(
            "/items/",
            post(handlers::items::create_item).get(handlers::items::list_items),
        )
        .route("/items/export", get(handlers::items::export_items))
        .route(
            "/items/:id",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/read-all",
            put(handlers::notifications::mark_all_notifications_read),
        )
        .route(
            "/notifications/:id/read",
            put(handlers::notifications::mark_notification_read),
        )
        .with_auth(state)
}

/// Routes reachable without a token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(handlers::auth::login))
        .route("/register", post(handlers::auth::register))
        .route("/healthz", get(handlers::health::healthz))
}

/// CORS policy from configuration. Explicit origins win over the permissive
/// fallback.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        // load_config rejects this combination; keep same-origin only.
        CorsLayer::new()
    }
}

/// Full application router with middleware applied
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(openapi::swagger_ui())
        .layer(tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
