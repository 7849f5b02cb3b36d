use crate::{
    auth::CurrentUser,
    entities::user,
    errors::ServiceError,
    services::RegisterUser,
    AppState,
};
use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    response::Response,
    Extension, Form, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::success_response;

/// OAuth2 password-flow form
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub username: String,
    #[schema(format = Password)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "access_token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
    "token_type": "bearer"
}))]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `bearer`
    pub token_type: String,
}

/// Public view of an account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "ops@example.com")]
    pub email: String,
    #[schema(example = "warehouse_ops")]
    pub username: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            is_active: model.is_active,
            is_admin: model.is_admin,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/token",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Result<Response, ServiceError> {
    let Form(request) = form?;
    let issued = state
        .services
        .users
        .login(&request.username, &request.password)
        .await?;

    Ok(success_response(TokenResponse {
        access_token: issued.access_token,
        token_type: "bearer".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUser,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 400, description = "Username or email already registered", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(input) = payload?;
    let created = state.services.users.register(input).await?;
    Ok(success_response(UserResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(Extension(CurrentUser(current)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(current))
}
