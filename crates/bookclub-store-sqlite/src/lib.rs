//! SQLite backend for the book club store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every invariant the core relies on is
//! enforced inside a single transaction or a single conditional statement, so
//! several processes may share one database file.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
