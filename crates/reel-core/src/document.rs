//! Documents, collections, and the [`Record`] bridge between typed entities
//! and the shape-free maps the store operates on.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Error, Id, Result};

/// A stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Primary key field present on every document.
pub const ID_FIELD: &str = "id";
/// Creation timestamp field present on every entity document.
pub const CREATED_AT_FIELD: &str = "created_at";

// ─── Collections ─────────────────────────────────────────────────────────────

/// The independent document collections. References between them are plain
/// ids; the store enforces no referential integrity.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
  Users,
  Videos,
  Comments,
  Likes,
  Subscriptions,
  Playlists,
  Tweets,
}

impl Collection {
  /// Singular name used in messages, e.g. `"video"`.
  pub fn entity_name(&self) -> &'static str {
    match self {
      Self::Users => "user",
      Self::Videos => "video",
      Self::Comments => "comment",
      Self::Likes => "like",
      Self::Subscriptions => "subscription",
      Self::Playlists => "playlist",
      Self::Tweets => "tweet",
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A typed entity stored as a document in a fixed collection.
pub trait Record: Serialize + DeserializeOwned {
  const COLLECTION: Collection;

  fn id(&self) -> Id;

  fn to_document(&self) -> Result<Document> { to_document(self) }

  fn from_document(doc: Document) -> Result<Self> { from_document(doc) }
}

/// Serialise any struct into a [`Document`]. Non-object values are rejected.
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> Result<Document> {
  match serde_json::to_value(value)? {
    Value::Object(map) => Ok(map),
    other => Err(Error::Serialization(<serde_json::Error as serde::ser::Error>::custom(
      format!("expected a JSON object, got {other}"),
    ))),
  }
}

/// Deserialise a [`Document`] into a typed record or view.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
  Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Read the primary key of a stored document.
pub fn document_id(doc: &Document) -> Result<Id> {
  let raw = doc.get(ID_FIELD).and_then(Value::as_str).ok_or_else(|| {
    Error::Serialization(<serde_json::Error as serde::de::Error>::missing_field(
      ID_FIELD,
    ))
  })?;
  Id::parse(raw)
}
