use crate::{
    auth::CurrentUser,
    entities::notification,
    errors::ServiceError,
    AppState,
};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::Response,
    Extension,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use super::common::{no_content_response, success_response};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNotificationsQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    /// Only return notifications that have not been read
    #[serde(default)]
    pub unread_only: bool,
}

#[utoipa::path(
    get,
    path = "/notifications",
    params(ListNotificationsQuery),
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = [notification::Model]),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    query: Result<Query<ListNotificationsQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(query) = query?;
    let page = state
        .services
        .notifications
        .page_limits()
        .resolve(query.skip, query.limit);

    let found = state
        .services
        .notifications
        .list_for_user(current.id, query.unread_only, page)
        .await?;
    Ok(success_response(found))
}

#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = notification::Model),
        (status = 404, description = "No such notification for this user", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ServiceError> {
    let Path(id) = id?;
    let updated = state
        .services
        .notifications
        .mark_read(id, current.id)
        .await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    put,
    path = "/notifications/read-all",
    responses(
        (status = 204, description = "Every notification of the caller is read"),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Response, ServiceError> {
    let changed = state
        .services
        .notifications
        .mark_all_read(current.id)
        .await?;
    info!(user_id = %current.id, changed, "notifications marked read");
    Ok(no_content_response())
}
