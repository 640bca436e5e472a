//! SQLite backend for the Rondo round store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The draw commit is a single
//! transaction, so a storage fault never leaves partial history marks or a
//! half-written assignment set.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
