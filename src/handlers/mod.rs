pub mod auth;
pub mod common;
pub mod health;
pub mod items;
pub mod notifications;

use crate::{
    auth::AuthService,
    db::DbPool,
    services::{ItemService, NotificationService, PageLimits, UserService},
};
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: UserService,
    pub items: ItemService,
    pub notifications: NotificationService,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, auth: Arc<AuthService>, limits: PageLimits) -> Self {
        Self {
            users: UserService::new(db_pool.clone(), auth),
            items: ItemService::new(db_pool.clone(), limits),
            notifications: NotificationService::new(db_pool, limits),
        }
    }
}
