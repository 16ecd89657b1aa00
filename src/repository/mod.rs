//! Data-access traits for the credential store and the task store.
//!
//! Handlers receive these as `web::Data<dyn UserRepository>` /
//! `web::Data<dyn TaskRepository>`. `postgres` holds the `sqlx` implementations
//! used by the binaries; `memory` holds process-local ones used by the tests.
//!
//! Every task operation that addresses a single row takes the caller's
//! `UserId` and matches on both `id` and `user_id`, so a row owned by someone
//! else is indistinguishable from a missing one.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskUpdate, User, UserId};

pub use memory::{MemoryTaskRepository, MemoryUserRepository};
pub use postgres::{PgTaskRepository, PgUserRepository};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user. Fails if the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Overwrites the user's single stored refresh token.
    async fn save_refresh_token(&self, user_id: UserId, token: &str) -> Result<(), AppError>;

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, user_id: UserId, input: &TaskInput) -> Result<Task, AppError>;

    /// All tasks owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Task>, AppError>;

    async fn find_for_user(&self, id: i64, user_id: UserId) -> Result<Option<Task>, AppError>;

    /// Returns `false` when no row matched `id` and `user_id`.
    async fn update_for_user(
        &self,
        id: i64,
        user_id: UserId,
        changes: &TaskUpdate,
    ) -> Result<bool, AppError>;

    /// Returns `false` when no row matched `id` and `user_id`.
    async fn delete_for_user(&self, id: i64, user_id: UserId) -> Result<bool, AppError>;
}
