use crate::{
    entities::{item, notification},
    errors::ServiceError,
    services::{PageLimits, Pagination},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Per-user low-stock alerts
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
    limits: PageLimits,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>, limits: PageLimits) -> Self {
        Self { db, limits }
    }

    pub fn page_limits(&self) -> PageLimits {
        self.limits
    }

    /// Newest first.
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: Pagination,
    ) -> Result<Vec<notification::Model>, ServiceError> {
        let mut query =
            notification::Entity::find().filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        query
            .order_by_desc(notification::Column::CreatedAt)
            .offset(page.skip)
            .limit(page.limit.min(self.limits.max_size))
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Marks one of the caller's notifications as read. Other users'
    /// notifications are reported as missing.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<notification::Model, ServiceError> {
        let existing = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Notification {} not found", notification_id))
            })?;

        if existing.is_read {
            return Ok(existing);
        }

        let mut active: notification::ActiveModel = existing.into();
        active.is_read = Set(true);
        Ok(active.update(&*self.db).await?)
    }

    /// Returns the number of notifications that changed state.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Inserts a low-stock alert for `item` on the caller's connection, so it
    /// commits or rolls back together with the item write.
    pub async fn record_low_stock<C>(
        conn: &C,
        user_id: Uuid,
        item: &item::Model,
    ) -> Result<notification::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        let created = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            item_id: Set(item.id),
            message: Set(notification::low_stock_message(&item.name, &item.sku)),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(conn)
        .await?;

        info!(
            notification_id = %created.id,
            item_id = %item.id,
            %user_id,
            "low stock notification recorded"
        );
        Ok(created)
    }
}
