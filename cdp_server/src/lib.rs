//! # Coder Duo payment server
//!
//! The HTTP face of the Coder Duo credit gateway. It opens Razorpay orders for credit packs, verifies the checkout
//! callback signature before crediting a user, accepts Razorpay webhooks and completes the OAuth sign-in flow.
//!
//! All the business logic lives in `cdp_engine`. The handlers here check signatures and sessions, translate the
//! engine's answers into the JSON bodies the storefront expects, and never touch a credit balance themselves.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
