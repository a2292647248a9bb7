//! Coder Duo Payment Engine
//!
//! The payment engine lets Coder Duo users buy credit packs through Razorpay and credits their accounts once the
//! payment has been verified. This library contains the core logic of the gateway. It is provider-agnostic.
//!
//! The library is divided into three main sections:
//! 1. The backend contracts ([`mod@traits`]). A backend stores orders, owns the credit ledger, serves the plan list and
//!    resolves sessions. Two backends ship with the engine: [`SupabaseDatabase`] for production and
//!    [`SqliteDatabase`], a self-contained backend for local development and tests.
//! 2. The data types shared by all backends ([`mod@db_types`]).
//! 3. The payment engine public API ([`mod@cdp_api`]). Servers should use these APIs rather than calling backends
//!    directly.
//!
//! The one invariant that matters most: a user's credit balance changes only through
//! [`CreditLedger::verify_payment_and_add_credits`](traits::CreditLedger::verify_payment_and_add_credits) (or the
//! webhook path of the same ledger), and a provider payment id is credited at most once.
pub mod cdp_api;
pub mod db_types;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "supabase")]
pub mod supabase;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use cdp_api::{
    auth_api::AuthApi,
    catalog_api::CatalogApi,
    checkout_api::CheckoutApi,
    checkout_objects::{CheckoutResult, CreateOrderRequest},
    credit_api::CreditApi,
    errors::{CheckoutError, CreditError},
    profile_api::ProfileApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteDatabaseError};
#[cfg(feature = "supabase")]
pub use supabase::{Anonymous, ServiceRole, SupabaseConfig, SupabaseDatabase};
