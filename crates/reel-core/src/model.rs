//! Entity records, one typed struct per stored collection.
//!
//! Every record carries its own `id` and a server-assigned `created_at`.
//! References between records are plain [`Id`]s; nothing here enforces that a
//! referenced document exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Collection, Id, Record};

// ─── User ────────────────────────────────────────────────────────────────────

/// A channel owner / viewer profile. Read by the views, never written by the
/// engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:              Id,
  pub username:        String,
  pub full_name:       String,
  /// Private: only projected by owner-facing views.
  pub email:           String,
  pub avatar_url:      String,
  pub cover_image_url: Option<String>,
  pub created_at:      DateTime<Utc>,
}

impl User {
  pub fn new(
    username: impl Into<String>,
    full_name: impl Into<String>,
    email: impl Into<String>,
  ) -> Self {
    Self {
      id:              Id::new(),
      username:        username.into(),
      full_name:       full_name.into(),
      email:           email.into(),
      avatar_url:      String::new(),
      cover_image_url: None,
      created_at:      Utc::now(),
    }
  }
}

impl Record for User {
  const COLLECTION: Collection = Collection::Users;

  fn id(&self) -> Id { self.id }
}

// ─── Video ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
  pub id:               Id,
  pub owner_id:         Id,
  pub title:            String,
  pub description:      String,
  pub media_url:        String,
  pub thumbnail_url:    String,
  pub duration_seconds: f64,
  pub view_count:       u64,
  /// Unpublished videos are hidden from public listings.
  pub is_published:     bool,
  pub created_at:       DateTime<Utc>,
}

impl Video {
  /// A published video with no media attached and zero views.
  pub fn new(
    owner_id: Id,
    title: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    Self {
      id: Id::new(),
      owner_id,
      title: title.into(),
      description: description.into(),
      media_url: String::new(),
      thumbnail_url: String::new(),
      duration_seconds: 0.0,
      view_count: 0,
      is_published: true,
      created_at: Utc::now(),
    }
  }
}

impl Record for Video {
  const COLLECTION: Collection = Collection::Videos;

  fn id(&self) -> Id { self.id }
}

// ─── Comment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         Id,
  pub video_id:   Id,
  pub owner_id:   Id,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

impl Comment {
  pub fn new(video_id: Id, owner_id: Id, content: impl Into<String>) -> Self {
    Self {
      id: Id::new(),
      video_id,
      owner_id,
      content: content.into(),
      created_at: Utc::now(),
    }
  }
}

impl Record for Comment {
  const COLLECTION: Collection = Collection::Comments;

  fn id(&self) -> Id { self.id }
}

// ─── Tweet ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
  pub id:         Id,
  pub owner_id:   Id,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

impl Tweet {
  pub fn new(owner_id: Id, content: impl Into<String>) -> Self {
    Self { id: Id::new(), owner_id, content: content.into(), created_at: Utc::now() }
  }
}

impl Record for Tweet {
  const COLLECTION: Collection = Collection::Tweets;

  fn id(&self) -> Id { self.id }
}

// ─── Playlist ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
  pub id:          Id,
  pub owner_id:    Id,
  pub name:        String,
  pub description: String,
  /// Ordered; each video appears at most once.
  pub video_ids:   Vec<Id>,
  pub created_at:  DateTime<Utc>,
}

impl Playlist {
  pub fn new(
    owner_id: Id,
    name: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    Self {
      id: Id::new(),
      owner_id,
      name: name.into(),
      description: description.into(),
      video_ids: Vec::new(),
      created_at: Utc::now(),
    }
  }
}

impl Record for Playlist {
  const COLLECTION: Collection = Collection::Playlists;

  fn id(&self) -> Id { self.id }
}

// ─── Relations ───────────────────────────────────────────────────────────────

/// Which entity type a [`Like`] targets.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubjectKind {
  Video,
  Comment,
  Tweet,
}

impl SubjectKind {
  /// The collection holding subjects of this kind.
  pub fn collection(self) -> Collection {
    match self {
      Self::Video => Collection::Videos,
      Self::Comment => Collection::Comments,
      Self::Tweet => Collection::Tweets,
    }
  }
}

impl From<SubjectKind> for serde_json::Value {
  fn from(kind: SubjectKind) -> Self {
    serde_json::Value::String(kind.as_ref().to_owned())
  }
}

/// At most one like exists per `(subject_kind, subject_id, actor_id)`.
/// Created and destroyed only by the toggle engine; never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
  pub id:           Id,
  pub subject_kind: SubjectKind,
  pub subject_id:   Id,
  pub actor_id:     Id,
  pub created_at:   DateTime<Utc>,
}

impl Like {
  pub fn new(subject_kind: SubjectKind, subject_id: Id, actor_id: Id) -> Self {
    Self {
      id: Id::new(),
      subject_kind,
      subject_id,
      actor_id,
      created_at: Utc::now(),
    }
  }
}

impl Record for Like {
  const COLLECTION: Collection = Collection::Likes;

  fn id(&self) -> Id { self.id }
}

/// At most one subscription exists per `(channel_id, subscriber_id)`. Both
/// are user ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
  pub id:            Id,
  pub channel_id:    Id,
  pub subscriber_id: Id,
  pub created_at:    DateTime<Utc>,
}

impl Subscription {
  pub fn new(channel_id: Id, subscriber_id: Id) -> Self {
    Self { id: Id::new(), channel_id, subscriber_id, created_at: Utc::now() }
  }
}

impl Record for Subscription {
  const COLLECTION: Collection = Collection::Subscriptions;

  fn id(&self) -> Id { self.id }
}
