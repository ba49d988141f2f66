//! Channel statistics: the view composer reduced to four counters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
  Collection, Document, Error, Id, Result,
  document::ID_FIELD,
  filter::Filter,
  model::SubjectKind,
  pipeline::{ComputedField, JoinSpec, Projection, Stage},
  store::DocumentStore,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
  pub total_views:       u64,
  pub total_videos:      u64,
  pub total_likes:       u64,
  pub total_subscribers: u64,
}

fn video_stages(owner_id: Id) -> Vec<Stage> {
  vec![
    Stage::Match(Filter::eq("owner_id", owner_id)),
    Stage::Lookup(
      JoinSpec::new(Collection::Likes, ID_FIELD, "subject_id", "likes")
        .filter(Filter::eq("subject_kind", SubjectKind::Video))
        .project(Projection::of(&[ID_FIELD])),
    ),
    Stage::AddFields(vec![ComputedField::size("likes_count", "likes")]),
    Stage::Project(Projection::of(&["view_count", "likes_count"])),
  ]
}

fn counter(doc: &Document, field: &str) -> u64 {
  doc.get(field).and_then(Value::as_u64).unwrap_or(0)
}

/// Totals for the channel of `owner_id`. Subscribers are counted once for
/// the channel, independently of how many videos it has.
pub async fn channel_stats<S: DocumentStore>(store: &S, owner_id: Id) -> Result<ChannelStats> {
  let videos = store
    .run_pipeline(Collection::Videos, video_stages(owner_id))
    .await
    .map_err(Error::store)?;

  let mut stats = videos.iter().fold(ChannelStats::default(), |mut acc, doc| {
    acc.total_videos += 1;
    acc.total_views += counter(doc, "view_count");
    acc.total_likes += counter(doc, "likes_count");
    acc
  });

  stats.total_subscribers = store
    .find(Collection::Subscriptions, Filter::eq("channel_id", owner_id))
    .await
    .map_err(Error::store)?
    .len() as u64;

  debug!(%owner_id, ?stats, "channel stats computed");
  Ok(stats)
}

/// [`channel_stats`] for the current actor's own channel.
pub async fn dashboard_stats<S: DocumentStore>(
  store: &S,
  actor: Option<Id>,
) -> Result<ChannelStats> {
  let actor = actor.ok_or_else(Error::no_actor)?;
  channel_stats(store, actor).await
}
