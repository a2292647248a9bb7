//! # Coder Duo payment engine public API
//!
//! The `cdp_api` module exposes the programmatic API of the payment engine. Each API wraps a backend that implements
//! the traits it needs, so callers can mix and match (e.g. Supabase for the ledger and a fake for the payment provider
//! in tests).
//!
//! * [`checkout_api`] opens a new credit pack order with the payment provider and keeps a local record of it.
//! * [`credit_api`] credits verified payments and forwards verified webhook events to the ledger.
//! * [`catalog_api`] serves the plan and credit pack list.
//! * [`profile_api`] applies profile updates for the signed-in user.
//! * [`auth_api`] resolves access tokens and OAuth codes into sessions.
//!
//! # API usage
//!
//! ```rust,ignore
//! use cdp_engine::{CheckoutApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = CheckoutApi::new(db.for_session(&session), razorpay);
//! let checkout = api.create_order(&session, request).await?;
//! ```

pub mod auth_api;
pub mod catalog_api;
pub mod checkout_api;
pub mod checkout_objects;
pub mod credit_api;
pub mod errors;
pub mod profile_api;
