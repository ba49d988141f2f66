//! Error types for `reel-core`.

use thiserror::Error;

use crate::{Collection, Id};

#[derive(Debug, Error)]
pub enum Error {
  /// A caller-supplied identifier is malformed.
  #[error("invalid reference: {0:?}")]
  InvalidReference(String),

  /// The base document of an operation does not exist.
  #[error("{} not found: {id}", .collection.entity_name())]
  NotFound { collection: Collection, id: Id },

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("a channel cannot subscribe to itself")]
  SelfSubscription,

  #[error("validation failed: {0}")]
  Validation(String),

  /// A store read or write did not take effect.
  #[error("persistence failure: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("blob storage failure: {0}")]
  Blob(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn not_found(collection: Collection, id: Id) -> Self {
    Self::NotFound { collection, id }
  }

  pub fn no_actor() -> Self {
    Self::Unauthorized("no current actor".to_owned())
  }

  /// Wrap a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }

  pub fn blob<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Blob(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
