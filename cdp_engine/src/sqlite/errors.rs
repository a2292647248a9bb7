use thiserror::Error;

use crate::traits::{AuthProviderError, CatalogError, CreditLedgerError, OrderStoreError, ProfileError};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("User account {0} already exists")]
    UserAlreadyExists(String),
}

impl From<SqliteDatabaseError> for OrderStoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

impl From<SqliteDatabaseError> for CreditLedgerError {
    fn from(e: SqliteDatabaseError) -> Self {
        CreditLedgerError::DatabaseError(e.to_string())
    }
}

impl From<SqliteDatabaseError> for CatalogError {
    fn from(e: SqliteDatabaseError) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

impl From<SqliteDatabaseError> for ProfileError {
    fn from(e: SqliteDatabaseError) -> Self {
        ProfileError::DatabaseError(e.to_string())
    }
}

impl From<SqliteDatabaseError> for AuthProviderError {
    fn from(e: SqliteDatabaseError) -> Self {
        AuthProviderError::DatabaseError(e.to_string())
    }
}
