//! SQLite backend for the reel document store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Documents are stored as JSON text;
//! pipelines are evaluated in-process by [`reel_core::eval`] over a reader
//! that pushes simple filters down to SQL.

mod codec;
mod reader;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
