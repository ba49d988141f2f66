//! Core types, the document store abstraction, and the read-model engines for
//! reel.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::DocumentStore`]; everything else in the
//! workspace talks to that trait and to the engines defined here:
//!
//! - [`toggle`]: create-or-remove protocol for likes and subscriptions.
//! - [`compose`] and [`views`]: joined, projected, viewer-relative records.
//! - [`search`]: two-phase search, sort, filter, and paginate for videos.
//! - [`stats`]: per-channel scalar counts.

pub mod compose;
pub mod document;
pub mod error;
pub mod eval;
pub mod filter;
pub mod id;
pub mod media;
pub mod model;
pub mod page;
pub mod pipeline;
pub mod playlist;
pub mod search;
pub mod stats;
pub mod store;
pub mod toggle;
pub mod views;

pub use document::{Collection, Document, Record};
pub use error::{Error, Result};
pub use id::Id;
