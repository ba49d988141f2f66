//! The relation toggle engine.
//!
//! A toggle creates the relation row for `(subject, actor)` if it is absent
//! and removes it if it is present. The store's uniqueness constraint on the
//! relation key is the source of truth: an insert rejected as a duplicate, or
//! a delete that finds the row already gone, means a concurrent toggle got
//! there first, and the whole check-then-act step is repeated.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
  Collection, Error, Id, Record, Result,
  document::document_id,
  filter::Filter,
  model::{Like, SubjectKind, Subscription},
  store::{self, DocumentStore},
};

/// Upper bound on check-then-act rounds before giving up with a conflict.
const MAX_ATTEMPTS: usize = 8;

// ─── Keys and relations ──────────────────────────────────────────────────────

/// What is being toggled, minus the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKey {
  Like { kind: SubjectKind, subject_id: Id },
  Subscription { channel_id: Id },
}

impl RelationKey {
  /// The collection holding relation rows of this kind.
  pub fn collection(&self) -> Collection {
    match self {
      Self::Like { .. } => Collection::Likes,
      Self::Subscription { .. } => Collection::Subscriptions,
    }
  }

  /// The document the relation points at.
  pub fn subject(&self) -> (Collection, Id) {
    match *self {
      Self::Like { kind, subject_id } => (kind.collection(), subject_id),
      Self::Subscription { channel_id } => (Collection::Users, channel_id),
    }
  }

  /// Matches the relation row of `actor`, if any.
  pub fn filter(&self, actor: Id) -> Filter {
    match *self {
      Self::Like { kind, subject_id } => Filter::eq("subject_kind", kind)
        .and(Filter::eq("subject_id", subject_id))
        .and(Filter::eq("actor_id", actor)),
      Self::Subscription { channel_id } => Filter::eq("channel_id", channel_id)
        .and(Filter::eq("subscriber_id", actor)),
    }
  }

  fn new_relation(&self, actor: Id) -> Relation {
    match *self {
      Self::Like { kind, subject_id } => {
        Relation::Like(Like::new(kind, subject_id, actor))
      }
      Self::Subscription { channel_id } => {
        Relation::Subscription(Subscription::new(channel_id, actor))
      }
    }
  }
}

/// A freshly created relation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Relation {
  Like(Like),
  Subscription(Subscription),
}

impl Relation {
  fn to_document(&self) -> Result<crate::Document> {
    match self {
      Self::Like(like) => like.to_document(),
      Self::Subscription(sub) => sub.to_document(),
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
  Added,
  Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toggled {
  pub state:    ToggleState,
  /// The created row; present only when `state` is `Added`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub relation: Option<Relation>,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Toggle the current actor's like on a video, comment, or tweet.
pub async fn toggle_like<S: DocumentStore>(
  store: &S,
  kind: SubjectKind,
  subject_id: &str,
  actor: Option<Id>,
) -> Result<Toggled> {
  let subject_id = Id::parse(subject_id)?;
  let actor = actor.ok_or_else(Error::no_actor)?;
  toggle(store, RelationKey::Like { kind, subject_id }, actor).await
}

/// Toggle the current actor's subscription to a channel. A channel cannot
/// subscribe to itself.
pub async fn toggle_subscription<S: DocumentStore>(
  store: &S,
  channel_id: &str,
  actor: Option<Id>,
) -> Result<Toggled> {
  let channel_id = Id::parse(channel_id)?;
  let actor = actor.ok_or_else(Error::no_actor)?;
  if channel_id == actor {
    return Err(Error::SelfSubscription);
  }
  toggle(store, RelationKey::Subscription { channel_id }, actor).await
}

/// Run the toggle protocol for `key` on behalf of `actor`.
///
/// Every returned state corresponds to a mutation this call performed, so
/// across any set of concurrent toggles the number of `Added` minus the
/// number of `Removed` equals the final row count.
pub async fn toggle<S: DocumentStore>(
  store: &S,
  key: RelationKey,
  actor: Id,
) -> Result<Toggled> {
  let (subject_collection, subject_id) = key.subject();
  if !store::exists(store, subject_collection, subject_id).await? {
    return Err(Error::not_found(subject_collection, subject_id));
  }

  let collection = key.collection();
  for attempt in 1..=MAX_ATTEMPTS {
    let existing = store
      .find(collection, key.filter(actor))
      .await
      .map_err(Error::store)?;

    match existing.first() {
      Some(doc) => {
        let id = document_id(doc)?;
        if store.delete_by_id(collection, id).await.map_err(Error::store)? {
          debug!(%collection, %subject_id, %actor, "relation removed");
          return Ok(Toggled { state: ToggleState::Removed, relation: None });
        }
        warn!(%collection, %subject_id, %actor, attempt, "relation vanished before delete, retrying");
      }
      None => {
        let relation = key.new_relation(actor);
        if store
          .insert(collection, relation.to_document()?)
          .await
          .map_err(Error::store)?
        {
          debug!(%collection, %subject_id, %actor, "relation added");
          return Ok(Toggled { state: ToggleState::Added, relation: Some(relation) });
        }
        warn!(%collection, %subject_id, %actor, attempt, "relation added concurrently, retrying");
      }
    }
  }

  Err(Error::Conflict(format!(
    "{} toggle for {subject_id} did not settle after {MAX_ATTEMPTS} attempts",
    collection.entity_name(),
  )))
}
