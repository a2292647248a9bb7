use thiserror::Error;

use crate::db_types::Plan;

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Could not fetch plans: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait PlanCatalog {
    /// All plans and packs, ordered by `display_order`.
    async fn fetch_plans(&self) -> Result<Vec<Plan>, CatalogError>;
    /// Only the one-off credit packs (`is_pack = true`), ordered by `display_order`.
    async fn fetch_credit_packs(&self) -> Result<Vec<Plan>, CatalogError>;
    /// The plan with a price of zero, if there is one.
    async fn fetch_free_plan(&self) -> Result<Option<Plan>, CatalogError>;
}
