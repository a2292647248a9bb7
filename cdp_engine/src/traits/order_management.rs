use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, ProviderOrderUpdate};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The backend rejected the request: {0}")]
    Rejected(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

/// Storage for the local record of a checkout. The local record is a convenience for reconciliation. Nothing in the
/// credit path depends on it being present, so callers are free to treat failures here as non-fatal.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order with status `created`. Fails with [`OrderStoreError::OrderAlreadyExists`] if the order id is
    /// taken.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    /// Records the payment provider's order id and raw response against the local order, and moves it to
    /// `provider_id_assigned`.
    async fn attach_provider_order(
        &self,
        order_id: &OrderId,
        update: ProviderOrderUpdate,
    ) -> Result<Order, OrderStoreError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
}
