#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use scanner_log_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db, AppState,
};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-with-plenty-of-bytes";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Application harness backed by a private in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            Some(TEST_SECRET.to_string()),
            "test".to_string(),
        );
        // Every connection to `sqlite::memory:` is a separate database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::from_config(Arc::new(pool), cfg).expect("valid test state");
        let router = scanner_log_api::build_router(state.clone());

        Self { router, state }
    }

    /// Token service sharing the harness secret, for hand-crafted tokens.
    pub fn auth_service(&self) -> AuthService {
        AuthService::new(AuthConfig::new(
            TEST_SECRET,
            chrono::Duration::minutes(30),
        ))
    }

    /// Send a request with an optional JSON body and bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        self.send(builder.body(body).expect("failed to build request"))
            .await
    }

    /// Send a prebuilt request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// POST an urlencoded login form.
    pub async fn login_response(&self, username: &str, password: &str) -> Response {
        let form = format!("username={}&password={}", username, password);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .expect("failed to build login request");
        self.send(request).await
    }

    pub async fn register(&self, username: &str) -> Response {
        self.request(
            Method::POST,
            "/register",
            Some(json!({
                "email": format!("{}@example.com", username),
                "username": username,
                "password": TEST_PASSWORD,
            })),
            None,
        )
        .await
    }

    /// Registers `username` and returns a fresh access token for it.
    pub async fn user_token(&self, username: &str) -> String {
        let response = self.register(username).await;
        assert_eq!(response.status(), StatusCode::OK, "registration failed");

        let response = self.login_response(username, TEST_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK, "login failed");
        let body = response_json(response).await;
        body["access_token"]
            .as_str()
            .expect("access_token in login response")
            .to_string()
    }

    /// Creates an item and returns its JSON representation.
    pub async fn create_item(&self, token: &str, payload: Value) -> Value {
        let response = self
            .request(Method::POST, "/items", Some(payload), Some(token))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "item creation failed");
        response_json(response).await
    }

    pub async fn notifications(&self, token: &str) -> Vec<Value> {
        let response = self
            .request(Method::GET, "/notifications", None, Some(token))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        response_json(response)
            .await
            .as_array()
            .cloned()
            .expect("notification list")
    }
}

pub async fn response_bytes(response: Response) -> Vec<u8> {
    body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes")
        .to_vec()
}

pub async fn response_json(response: Response) -> Value {
    serde_json::from_slice(&response_bytes(response).await).expect("json response")
}

pub async fn response_text(response: Response) -> String {
    String::from_utf8(response_bytes(response).await).expect("utf-8 response")
}
