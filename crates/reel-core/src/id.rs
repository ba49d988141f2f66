//! Document identifiers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The primary key of every stored document, and the value of every
/// cross-collection reference.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id(Uuid);

impl Id {
  pub fn new() -> Self { Self(Uuid::new_v4()) }

  /// Parse a caller-supplied identifier. Anything that is not a hyphenated or
  /// simple UUID is an [`Error::InvalidReference`].
  pub fn parse(raw: &str) -> Result<Self> {
    Uuid::parse_str(raw.trim())
      .map(Self)
      .map_err(|_| Error::InvalidReference(raw.to_owned()))
  }

  pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl Default for Id {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.hyphenated())
  }
}

impl FromStr for Id {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl From<Uuid> for Id {
  fn from(id: Uuid) -> Self { Self(id) }
}

impl From<Id> for serde_json::Value {
  fn from(id: Id) -> Self { serde_json::Value::String(id.to_string()) }
}
