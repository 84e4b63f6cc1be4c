//! User repository for database operations.

use docket_shared::auth::UserView;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::users;

/// Input for creating a user. `username` must already be normalized.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Lower-cased login name.
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Display name.
    pub name: String,
    /// Contact phone.
    pub phone: String,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by normalized username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Creates a new active user.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including a unique violation
    /// when the username is taken.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(input.username),
            password_hash: Set(input.password_hash),
            name: Set(input.name),
            phone: Set(input.phone),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Checks if a username is already registered.
    pub async fn username_exists(&self, username: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Enables or disables sign-in for a user.
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<users::Model>, DbErr> {
        let Some(user) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let mut model: users::ActiveModel = user.into();
        model.is_active = Set(active);
        model.update(&self.db).await.map(Some)
    }
}

/// Public view of a user row.
#[must_use]
pub fn to_view(user: &users::Model) -> UserView {
    UserView {
        id: user.id,
        username: user.username.clone(),
        name: user.name.clone(),
        phone: user.phone.clone(),
        active: user.is_active,
    }
}
