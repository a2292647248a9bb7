//! # Backend contracts
//!
//! This module defines the behaviour that backends must expose in order to serve the Coder Duo payment gateway.
//!
//! * [`OrderManagement`] stores the local record of a checkout before and after the payment provider sees it.
//! * [`CreditLedger`] is the only path through which a user's credit balance changes. Implementations must credit a
//!   given provider payment id at most once.
//! * [`PlanCatalog`] serves the read-only plan and credit pack list.
//! * [`ProfileManagement`] applies caller-supplied updates to the user row.
//! * [`AuthProvider`] resolves access tokens into [`Session`]s and exchanges OAuth codes for new sessions.
//! * [`PaymentProvider`] creates orders with the external payment processor.
//!
//! Backends are constructed once, at server start-up, and then scoped to each request via [`RequestScoped`].
//! [`PaymentBackend`] is a convenience umbrella for a backend that does everything the server needs.
mod auth_provider;
mod credit_ledger;
mod data_objects;
mod order_management;
mod payment_provider;
mod plan_catalog;
mod profile_management;

pub use auth_provider::{AuthProvider, AuthProviderError};
pub use credit_ledger::{CreditLedger, CreditLedgerError};
pub use data_objects::{ProviderOrder, ProviderOrderRequest};
pub use order_management::{OrderManagement, OrderStoreError};
pub use payment_provider::{PaymentProvider, ProviderError};
pub use plan_catalog::{CatalogError, PlanCatalog};
pub use profile_management::{ProfileError, ProfileManagement};

use crate::db_types::Session;

/// A backend handle that can be narrowed to act on behalf of a single authenticated caller.
///
/// The unscoped handle acts for anonymous callers (or with whatever privileges it was constructed with).
pub trait RequestScoped: Clone {
    fn for_session(&self, session: &Session) -> Self;
}

pub trait PaymentBackend:
    OrderManagement + CreditLedger + PlanCatalog + ProfileManagement + AuthProvider + RequestScoped
{
}

impl<T> PaymentBackend for T where
    T: OrderManagement + CreditLedger + PlanCatalog + ProfileManagement + AuthProvider + RequestScoped
{
}
