//! Supabase backend for the Coder Duo payment engine.
//!
//! Orders, plans and profiles go through PostgREST. Credits go through the `verify_payment_and_add_credits` and
//! `handle_razorpay_webhook` database procedures, which own the ledger's at-most-once guarantee. Sessions are resolved
//! by GoTrue.
//!
//! The privileges a handle uses are fixed by its [`Capability`] type parameter. A server with the service role key
//! runs on `SupabaseDatabase<ServiceRole>`; one without runs on `SupabaseDatabase<Anonymous>`, which acts with the
//! caller's own access token when scoped to a session.
mod capability;
mod config;
mod errors;
mod supabase_impl;

pub use capability::{Anonymous, Capability, ServiceRole};
pub use config::SupabaseConfig;
pub use errors::SupabaseError;
pub use supabase_impl::SupabaseDatabase;
