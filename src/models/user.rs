use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Numeric identifier of a user, as stored in `users.id` and carried in the token subject.
pub type UserId = i64;

/// A row of the `users` table.
///
/// `password_hash` and `refresh_token` never leave the service.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// The single active refresh token; overwritten on each login.
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}
