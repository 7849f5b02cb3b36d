/*!
 * # Authentication
 *
 * Bearer-token authentication for the inventory API:
 *
 * - HS256 access tokens whose subject is the username
 * - Argon2id password hashing (see [`password`])
 * - A middleware that resolves the bearer token to an active user and stores
 *   it in the request extensions as [`CurrentUser`]
 *
 * The signing secret is injected through [`AuthConfig`]; nothing here reads
 * process-global state.
 */

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{entities::user, errors::ServiceError, AppState};

pub mod password;

pub use password::{hash_password, verify_password};

/// Claim structure for access tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: String,
    pub access_token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, access_token_ttl: Duration) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_token_ttl,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .finish()
    }
}

/// Freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: Duration,
}

/// Issues and validates access tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Signs a token for `subject` with the configured lifetime.
    pub fn issue_token(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        self.issue_token_with_ttl(subject, self.config.access_token_ttl)
    }

    /// Signs a token for `subject` that expires `ttl` from now.
    pub fn issue_token_with_ttl(
        &self,
        subject: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            expires_in: ttl,
        })
    }

    /// Validate a token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Token subject does not match a user")]
    UnknownSubject,

    #[error("Inactive user")]
    InactiveUser,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// The active user behind the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

/// Rejects the request unless it carries a valid token for an active user.
pub async fn require_active_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingToken)?;
    let user = state.services.users.get_active_user(token).await?;

    debug!(user_id = %user.id, "request authenticated");
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self, state: AppState) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self, state: AppState) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            state,
            require_active_user,
        ))
    }
}
