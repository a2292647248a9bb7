//! SQLite backend for the Coder Duo payment engine.
//!
//! This backend is self-contained: it keeps its own users, sessions and plans, so the gateway can be run locally and
//! tested without a hosted database.
mod errors;
mod sqlite_impl;

pub mod db;
pub use errors::SqliteDatabaseError;
pub use sqlite_impl::SqliteDatabase;
