use crate::{
    entities::{item, notification},
    errors::ServiceError,
    services::{
        export::{self, ExportFile, ExportFormat},
        notifications::NotificationService,
        PageLimits, Pagination,
    },
};
use chrono::Utc;
use sea_orm::{
    sea_query::{BinOper, Condition, Expr, Func},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

fn default_min_quantity() -> i32 {
    item::DEFAULT_MIN_QUANTITY
}

/// Input for creating an item
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateItemInput {
    #[schema(example = "Handheld Barcode Scanner")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "SCN-001")]
    pub sku: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default = "default_min_quantity")]
    #[schema(default = 10)]
    pub min_quantity: i32,
    pub category: Option<String>,
    pub location: Option<String>,
}

/// Partial update; absent or null fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<i32>,
    pub min_quantity: Option<i32>,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl UpdateItemInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.sku.is_none()
            && self.quantity.is_none()
            && self.min_quantity.is_none()
            && self.category.is_none()
            && self.location.is_none()
    }
}

/// List filters; every filter is optional and they combine with AND
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Case-insensitive substring over name, description and SKU
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
    pub location: Option<String>,
}

impl ItemFilter {
    fn apply(&self, mut query: Select<item::Entity>) -> Select<item::Entity> {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            // Both sides go through the database's lower() so they fold alike.
            let pattern = format!("%{}%", search);
            let matches = |column: item::Column| {
                Expr::expr(Func::lower(Expr::col(column)))
                    .binary(BinOper::Like, Func::lower(Expr::val(pattern.as_str())))
            };
            query = query.filter(
                Condition::any()
                    .add(matches(item::Column::Name))
                    .add(matches(item::Column::Description))
                    .add(matches(item::Column::Sku)),
            );
        }
        if let Some(category) = &self.category {
            query = query.filter(item::Column::Category.eq(category.as_str()));
        }
        if let Some(min) = self.min_quantity {
            query = query.filter(item::Column::Quantity.gte(min));
        }
        if let Some(max) = self.max_quantity {
            query = query.filter(item::Column::Quantity.lte(max));
        }
        if let Some(location) = &self.location {
            query = query.filter(item::Column::Location.eq(location.as_str()));
        }
        query
    }
}

/// Item catalog. Mutations that cross the low-stock threshold record a
/// notification in the same transaction.
#[derive(Clone)]
pub struct ItemService {
    db: Arc<DatabaseConnection>,
    limits: PageLimits,
}

impl ItemService {
    pub fn new(db: Arc<DatabaseConnection>, limits: PageLimits) -> Self {
        Self { db, limits }
    }

    pub fn page_limits(&self) -> PageLimits {
        self.limits
    }

    /// Create a new item on behalf of `creator_id`
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateItemInput,
        creator_id: Uuid,
    ) -> Result<item::Model, ServiceError> {
        let txn = self.db.begin().await?;
        ensure_unique_sku(&txn, &input.sku, None).await?;

        let now = Utc::now();
        let created = item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            sku: Set(input.sku),
            quantity: Set(input.quantity),
            min_quantity: Set(input.min_quantity),
            category: Set(input.category),
            location: Set(input.location),
            created_at: Set(now),
            updated_at: Set(now),
            created_by: Set(creator_id),
        }
        .insert(&txn)
        .await
        .map_err(map_sku_violation)?;

        if created.is_low_stock() {
            NotificationService::record_low_stock(&txn, creator_id, &created).await?;
        }

        txn.commit().await?;
        info!(item_id = %created.id, sku = %created.sku, "item created");
        Ok(created)
    }

    /// Filtered listing ordered by name
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &ItemFilter,
        page: Pagination,
    ) -> Result<Vec<item::Model>, ServiceError> {
        filter
            .apply(item::Entity::find())
            .order_by_asc(item::Column::Name)
            .offset(page.skip)
            .limit(page.limit.min(self.limits.max_size))
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, item_id: Uuid) -> Result<item::Model, ServiceError> {
        find_item(&*self.db, item_id).await
    }

    /// Applies the supplied fields. An empty patch returns the stored item
    /// without writing anything.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        item_id: Uuid,
        patch: UpdateItemInput,
        actor_id: Uuid,
    ) -> Result<item::Model, ServiceError> {
        if patch.is_empty() {
            debug!(%item_id, "empty patch; nothing to write");
            return self.get(item_id).await;
        }

        let txn = self.db.begin().await?;
        let existing = find_item(&txn, item_id).await?;

        if let Some(sku) = patch.sku.as_deref().filter(|sku| *sku != existing.sku) {
            ensure_unique_sku(&txn, sku, Some(item_id)).await?;
        }

        let mut active: item::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(sku) = patch.sku {
            active.sku = Set(sku);
        }
        if let Some(quantity) = patch.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(min_quantity) = patch.min_quantity {
            active.min_quantity = Set(min_quantity);
        }
        if let Some(category) = patch.category {
            active.category = Set(Some(category));
        }
        if let Some(location) = patch.location {
            active.location = Set(Some(location));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await.map_err(map_sku_violation)?;

        if updated.is_low_stock() {
            NotificationService::record_low_stock(&txn, actor_id, &updated).await?;
        }

        txn.commit().await?;
        info!(%item_id, "item updated");
        Ok(updated)
    }

    /// Deletes the item together with every notification that references it
    #[instrument(skip(self))]
    pub async fn delete(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        find_item(&txn, item_id).await?;

        let removed = notification::Entity::delete_many()
            .filter(notification::Column::ItemId.eq(item_id))
            .exec(&txn)
            .await?;
        item::Entity::delete_by_id(item_id).exec(&txn).await?;

        txn.commit().await?;
        info!(
            %item_id,
            notifications_removed = removed.rows_affected,
            "item deleted"
        );
        Ok(())
    }

    /// Every item, ordered by name, rendered as CSV or JSON
    #[instrument(skip(self))]
    pub async fn export(&self, format: ExportFormat) -> Result<ExportFile, ServiceError> {
        let items = item::Entity::find()
            .order_by_asc(item::Column::Name)
            .all(&*self.db)
            .await?;
        debug!(count = items.len(), %format, "exporting items");
        export::render(format, &items)
    }
}

async fn find_item<C>(conn: &C, item_id: Uuid) -> Result<item::Model, ServiceError>
where
    C: ConnectionTrait,
{
    item::Entity::find_by_id(item_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))
}

async fn ensure_unique_sku<C>(
    conn: &C,
    sku: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let mut query = item::Entity::find().filter(item::Column::Sku.eq(sku));
    if let Some(id) = exclude_id {
        query = query.filter(item::Column::Id.ne(id));
    }

    if query.one(conn).await?.is_some() {
        return Err(ServiceError::Conflict(format!("SKU {} already exists", sku)));
    }

    Ok(())
}

fn map_sku_violation(err: sea_orm::DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::Conflict("SKU already exists".to_string())
        }
        _ => ServiceError::from(err),
    }
}
