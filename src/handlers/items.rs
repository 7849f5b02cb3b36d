use crate::{
    auth::CurrentUser,
    entities::item,
    errors::ServiceError,
    services::{CreateItemInput, ExportFormat, ItemFilter, UpdateItemInput},
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::common::{created_response, no_content_response, success_response};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListItemsQuery {
    /// Rows to skip (default 0)
    pub skip: Option<u64>,
    /// Page size (default 100, capped by configuration)
    pub limit: Option<u64>,
    /// Case-insensitive match on name, description or SKU
    pub search: Option<String>,
    pub category: Option<String>,
    /// Only items with quantity at or above this value
    pub min_quantity: Option<i32>,
    /// Only items with quantity at or below this value
    pub max_quantity: Option<i32>,
    pub location: Option<String>,
}

impl ListItemsQuery {
    fn filter(&self) -> ItemFilter {
        ItemFilter {
            search: self.search.clone(),
            category: self.category.clone(),
            min_quantity: self.min_quantity,
            max_quantity: self.max_quantity,
            location: self.location.clone(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `csv` or `json`
    #[param(example = "csv")]
    pub format: String,
}

#[utoipa::path(
    post,
    path = "/items",
    request_body = CreateItemInput,
    responses(
        (status = 201, description = "Item created", body = item::Model),
        (status = 400, description = "SKU already exists", body = crate::errors::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    payload: Result<Json<CreateItemInput>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(input) = payload?;
    let created = state.services.items.create(input, current.id).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "Items ordered by name", body = [item::Model]),
        (status = 401, description = "Not authenticated", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    query: Result<Query<ListItemsQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(query) = query?;
    let page = state
        .services
        .items
        .page_limits()
        .resolve(query.skip, query.limit);

    let items = state.services.items.list(&query.filter(), page).await?;
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/items/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "Attachment with every item; `text/csv` or `application/json` depending on format", body = String, content_type = "text/csv"),
        (status = 422, description = "Unsupported format", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn export_items(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(query) = query?;
    let format: ExportFormat = query.format.parse()?;
    let file = state.services.items.export(format).await?;

    let disposition = HeaderValue::from_str(&file.content_disposition())
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(file.content_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.body,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item found", body = item::Model),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ServiceError> {
    let Path(id) = id?;
    let found = state.services.items.get(id).await?;
    Ok(success_response(found))
}

#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateItemInput,
    responses(
        (status = 200, description = "Item updated", body = item::Model),
        (status = 400, description = "SKU already exists", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateItemInput>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    let updated = state.services.items.update(id, patch, current.id).await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item and its notifications deleted"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ServiceError> {
    let Path(id) = id?;
    state.services.items.delete(id).await?;
    Ok(no_content_response())
}
