use serde_json::Value;
use thiserror::Error;

use crate::db_types::{ProfileUpdate, UserId};

#[derive(Debug, Clone, Error)]
pub enum ProfileError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User {0} does not exist")]
    UserNotFound(UserId),
    #[error("{0}")]
    Rejected(String),
}

impl From<sqlx::Error> for ProfileError {
    fn from(e: sqlx::Error) -> Self {
        ProfileError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait ProfileManagement {
    /// Applies the update to the user row and returns the updated row(s). [`ProfileUpdate`] has already stripped the
    /// protected fields, so implementations write every field they are given.
    async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> Result<Vec<Value>, ProfileError>;
}
