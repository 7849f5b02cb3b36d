use crate::auth::CurrentUser;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Username of the caller, on the protected probe only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        user: None,
    })
}

/// Same as `/healthz` but behind authentication
#[utoipa::path(
    get,
    path = "/protected-healthz",
    responses(
        (status = 200, description = "Service is up and the token is valid", body = HealthResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "health"
)]
pub async fn protected_healthz(
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        user: Some(current.username),
    })
}
