use crate::{
    auth::{hash_password, verify_password, AuthError, AuthService, IssuedToken},
    entities::user,
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Condition, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const DUPLICATE_USER: &str = "Username or email already registered";

/// Registration payload
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(email)]
    #[schema(example = "ops@example.com")]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "warehouse_ops")]
    pub username: String,
    #[validate(length(min = 1))]
    #[schema(example = "s3cret-passphrase", format = Password)]
    pub password: String,
}

/// User directory: registration, credential checks and token resolution
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    /// Creates an account. Username and email must both be unused.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: RegisterUser) -> Result<user::Model, ServiceError> {
        input.validate()?;

        let existing = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(input.username.as_str()))
                    .add(user::Column::Email.eq(input.email.as_str())),
            )
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(DUPLICATE_USER.to_string()));
        }

        let password = input.password;
        let hashed_password = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::InternalError(e.to_string()))??;

        let now = Utc::now();
        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            username: Set(input.username),
            hashed_password: Set(hashed_password),
            is_active: Set(true),
            is_admin: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = account.insert(&*self.db).await.map_err(|e| {
            // Lost a race with a concurrent registration.
            if let Some(SqlErr::UniqueConstraintViolation(_)) = e.sql_err() {
                ServiceError::Conflict(DUPLICATE_USER.to_string())
            } else {
                ServiceError::from(e)
            }
        })?;

        info!(user_id = %created.id, "user registered");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, ServiceError> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Returns the user when `password` matches the stored hash.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<user::Model>, ServiceError> {
        let Some(account) = self.find_by_username(username).await? else {
            return Ok(None);
        };

        let password = password.to_string();
        let hash = account.hashed_password.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        Ok(matches.then_some(account))
    }

    /// Checks credentials and signs an access token for the user.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, ServiceError> {
        match self.authenticate(username, password).await? {
            Some(account) => Ok(self.auth.issue_token(&account.username)?),
            None => {
                warn!("rejected login attempt");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    /// Resolves a bearer token to an active user.
    #[instrument(skip(self, token))]
    pub async fn get_active_user(&self, token: &str) -> Result<user::Model, ServiceError> {
        let claims = self.auth.validate_token(token)?;

        let account = self
            .find_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        if !account.is_active {
            return Err(AuthError::InactiveUser.into());
        }

        Ok(account)
    }
}
