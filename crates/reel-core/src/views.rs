//! The view catalogue: one [`ViewSpec`] and one typed record per listing or
//! detail view.
//!
//! View records reject unknown fields, so a projection that lets a private
//! field through fails to decode instead of leaking it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  Collection, Error, Id, Result,
  compose::{ViewSpec, compose, compose_one, compose_page},
  document::ID_FIELD,
  filter::Filter,
  model::SubjectKind,
  page::{Page, PageRequest},
  pipeline::{ComputedField, JoinSpec, Projection, Stage},
  store::{self, DocumentStore},
};

// ─── Owner profiles ──────────────────────────────────────────────────────────

/// The public face of a user. Safe to embed in any view.
///
/// User documents are written outside this crate, so every profile field may
/// be missing; a missing field decodes as `None` rather than failing the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwnerProfile {
  pub id:         Id,
  #[serde(default)]
  pub username:   Option<String>,
  #[serde(default)]
  pub full_name:  Option<String>,
  #[serde(default)]
  pub avatar_url: Option<String>,
}

/// A user profile including contact details. Only embedded in views whose
/// audience is the owner themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwnerContact {
  pub id:              Id,
  #[serde(default)]
  pub username:        Option<String>,
  #[serde(default)]
  pub full_name:       Option<String>,
  #[serde(default)]
  pub avatar_url:      Option<String>,
  #[serde(default)]
  pub email:           Option<String>,
  #[serde(default)]
  pub cover_image_url: Option<String>,
}

pub fn public_profile() -> Projection {
  Projection::of(&["id", "username", "full_name", "avatar_url"])
}

pub fn contact_profile() -> Projection {
  public_profile().field("email").field("cover_image_url")
}

// ─── Shared building blocks ──────────────────────────────────────────────────

/// The owner of a document as a single public profile under `owner`.
pub(crate) fn owner_join(profile: Projection) -> JoinSpec {
  JoinSpec::user("owner_id", "owner", profile)
}

/// Attach the likes of each base document, count them, and flag whether
/// `viewer` is among the likers. Without a viewer the flag is `false`.
fn with_likes(spec: ViewSpec, kind: SubjectKind, viewer: Option<Id>) -> ViewSpec {
  spec
    .join(
      JoinSpec::new(Collection::Likes, ID_FIELD, "subject_id", "likes")
        .filter(Filter::eq("subject_kind", kind)),
    )
    .compute(ComputedField::size("likes_count", "likes"))
    .compute(ComputedField::contains(
      "is_liked",
      "likes",
      "actor_id",
      viewer.map(Value::from),
    ))
}

// ─── Videos ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoDetail {
  pub id:               Id,
  pub title:            String,
  pub description:      String,
  pub media_url:        String,
  pub thumbnail_url:    String,
  pub duration_seconds: f64,
  pub view_count:       u64,
  pub is_published:     bool,
  pub created_at:       DateTime<Utc>,
  pub owner:            Option<OwnerContact>,
  pub likes_count:      u64,
  pub is_liked:         bool,
}

pub fn video_detail_spec(viewer: Option<Id>) -> ViewSpec {
  let spec = ViewSpec::new(
    Collection::Videos,
    Projection::of(&[
      "id",
      "title",
      "description",
      "media_url",
      "thumbnail_url",
      "duration_seconds",
      "view_count",
      "is_published",
      "created_at",
      "owner",
      "likes_count",
      "is_liked",
    ]),
  )
  .join(owner_join(contact_profile()));
  with_likes(spec, SubjectKind::Video, viewer)
}

pub async fn video_detail<S: DocumentStore>(
  store: &S,
  video_id: &str,
  viewer: Option<Id>,
) -> Result<VideoDetail> {
  let video_id = Id::parse(video_id)?;
  compose_one(store, &video_detail_spec(viewer), video_id).await
}

/// A video as it appears in listings: search results, playlists, likes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoSummary {
  pub id:               Id,
  pub title:            String,
  pub description:      String,
  pub thumbnail_url:    String,
  pub duration_seconds: f64,
  pub view_count:       u64,
  pub created_at:       DateTime<Utc>,
  pub owner:            Option<OwnerProfile>,
}

pub fn video_summary_projection() -> Projection {
  Projection::of(&[
    "id",
    "title",
    "description",
    "thumbnail_url",
    "duration_seconds",
    "view_count",
    "created_at",
    "owner",
  ])
}

/// Stages turning raw video documents into [`VideoSummary`] documents.
pub(crate) fn video_summary_stages() -> Vec<Stage> {
  vec![
    Stage::Lookup(owner_join(public_profile())),
    Stage::Project(video_summary_projection()),
  ]
}

/// A video on its owner's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelVideo {
  pub id:               Id,
  pub title:            String,
  pub description:      String,
  pub thumbnail_url:    String,
  pub duration_seconds: f64,
  pub view_count:       u64,
  pub is_published:     bool,
  pub created_at:       DateTime<Utc>,
  pub likes_count:      u64,
}

pub fn channel_videos_spec(owner_id: Id) -> ViewSpec {
  let spec = ViewSpec::new(
    Collection::Videos,
    Projection::of(&[
      "id",
      "title",
      "description",
      "thumbnail_url",
      "duration_seconds",
      "view_count",
      "is_published",
      "created_at",
      "likes_count",
    ]),
  )
  .filter(Filter::eq("owner_id", owner_id));
  with_likes(spec, SubjectKind::Video, None)
}

/// Every video of the current actor's channel, published or not.
pub async fn channel_videos<S: DocumentStore>(
  store: &S,
  actor: Option<Id>,
) -> Result<Vec<ChannelVideo>> {
  let actor = actor.ok_or_else(Error::no_actor)?;
  compose(store, &channel_videos_spec(actor)).await
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentView {
  pub id:          Id,
  pub content:     String,
  pub created_at:  DateTime<Utc>,
  pub owner:       Option<OwnerProfile>,
  pub likes_count: u64,
  pub is_liked:    bool,
}

pub fn video_comments_spec(video_id: Id, viewer: Option<Id>) -> ViewSpec {
  let spec = ViewSpec::new(
    Collection::Comments,
    Projection::of(&["id", "content", "created_at", "owner", "likes_count", "is_liked"]),
  )
  .filter(Filter::eq("video_id", video_id))
  .join(owner_join(public_profile()));
  with_likes(spec, SubjectKind::Comment, viewer)
}

/// Comments on a video, newest first. The video itself must exist.
pub async fn video_comments<S: DocumentStore>(
  store: &S,
  video_id: &str,
  viewer: Option<Id>,
  page: PageRequest,
) -> Result<Page<CommentView>> {
  let video_id = Id::parse(video_id)?;
  if !store::exists(store, Collection::Videos, video_id).await? {
    return Err(Error::not_found(Collection::Videos, video_id));
  }
  compose_page(store, &video_comments_spec(video_id, viewer), page).await
}

// ─── Tweets ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TweetView {
  pub id:          Id,
  pub content:     String,
  pub created_at:  DateTime<Utc>,
  pub owner:       Option<OwnerContact>,
  pub likes_count: u64,
  pub is_liked:    bool,
}

pub fn user_tweets_spec(owner_id: Id, viewer: Option<Id>) -> ViewSpec {
  let spec = ViewSpec::new(
    Collection::Tweets,
    Projection::of(&["id", "content", "created_at", "owner", "likes_count", "is_liked"]),
  )
  .filter(Filter::eq("owner_id", owner_id))
  .join(owner_join(contact_profile()));
  with_likes(spec, SubjectKind::Tweet, viewer)
}

pub async fn user_tweets<S: DocumentStore>(
  store: &S,
  user_id: &str,
  viewer: Option<Id>,
) -> Result<Vec<TweetView>> {
  let user_id = Id::parse(user_id)?;
  compose(store, &user_tweets_spec(user_id, viewer)).await
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriberView {
  pub id:         Id,
  pub created_at: DateTime<Utc>,
  pub subscriber: Option<OwnerProfile>,
}

pub fn channel_subscribers_spec(channel_id: Id) -> ViewSpec {
  ViewSpec::new(
    Collection::Subscriptions,
    Projection::of(&["id", "created_at", "subscriber"]),
  )
  .filter(Filter::eq("channel_id", channel_id))
  .join(JoinSpec::user("subscriber_id", "subscriber", public_profile()))
}

pub async fn channel_subscribers<S: DocumentStore>(
  store: &S,
  channel_id: &str,
) -> Result<Vec<SubscriberView>> {
  let channel_id = Id::parse(channel_id)?;
  compose(store, &channel_subscribers_spec(channel_id)).await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscribedChannelView {
  pub id:         Id,
  pub created_at: DateTime<Utc>,
  pub channel:    Option<OwnerProfile>,
}

pub fn subscribed_channels_spec(subscriber_id: Id) -> ViewSpec {
  ViewSpec::new(
    Collection::Subscriptions,
    Projection::of(&["id", "created_at", "channel"]),
  )
  .filter(Filter::eq("subscriber_id", subscriber_id))
  .join(JoinSpec::user("channel_id", "channel", public_profile()))
}

pub async fn subscribed_channels<S: DocumentStore>(
  store: &S,
  subscriber_id: &str,
) -> Result<Vec<SubscribedChannelView>> {
  let subscriber_id = Id::parse(subscriber_id)?;
  compose(store, &subscribed_channels_spec(subscriber_id)).await
}

// ─── Liked videos ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LikedVideoView {
  /// The like, not the video.
  pub id:         Id,
  pub created_at: DateTime<Utc>,
  pub video:      VideoSummary,
}

/// Decoded form of a liked-video document before dangling likes are dropped.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LikedVideoRow {
  id:         Id,
  created_at: DateTime<Utc>,
  video:      Option<VideoSummary>,
}

pub fn liked_videos_spec(actor: Id) -> ViewSpec {
  let video = video_summary_stages().into_iter().fold(
    JoinSpec::new(Collection::Videos, "subject_id", ID_FIELD, "video").first(),
    JoinSpec::then,
  );
  ViewSpec::new(Collection::Likes, Projection::of(&["id", "created_at", "video"]))
    .filter(Filter::eq("subject_kind", SubjectKind::Video))
    .filter(Filter::eq("actor_id", actor))
    .join(video)
}

/// Videos the current actor has liked, most recently liked first. Likes of
/// videos that no longer exist are skipped.
pub async fn liked_videos<S: DocumentStore>(
  store: &S,
  actor: Option<Id>,
) -> Result<Vec<LikedVideoView>> {
  let actor = actor.ok_or_else(Error::no_actor)?;
  let rows: Vec<LikedVideoRow> = compose(store, &liked_videos_spec(actor)).await?;
  Ok(
    rows
      .into_iter()
      .filter_map(|row| {
        Some(LikedVideoView { id: row.id, created_at: row.created_at, video: row.video? })
      })
      .collect(),
  )
}

// ─── Playlists ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaylistView {
  pub id:           Id,
  pub name:         String,
  pub description:  String,
  pub created_at:   DateTime<Utc>,
  pub owner:        Option<OwnerProfile>,
  /// In playlist order.
  pub videos:       Vec<VideoSummary>,
  pub total_videos: u64,
}

pub fn playlist_spec() -> ViewSpec {
  let videos = video_summary_stages().into_iter().fold(
    JoinSpec::new(Collection::Videos, "video_ids", ID_FIELD, "videos"),
    JoinSpec::then,
  );
  ViewSpec::new(
    Collection::Playlists,
    Projection::of(&[
      "id",
      "name",
      "description",
      "created_at",
      "owner",
      "videos",
      "total_videos",
    ]),
  )
  .join(owner_join(public_profile()))
  .join(videos)
  .compute(ComputedField::size("total_videos", "videos"))
}

pub async fn user_playlists<S: DocumentStore>(
  store: &S,
  user_id: &str,
) -> Result<Vec<PlaylistView>> {
  let user_id = Id::parse(user_id)?;
  compose(store, &playlist_spec().filter(Filter::eq("owner_id", user_id))).await
}

pub async fn playlist_by_id<S: DocumentStore>(
  store: &S,
  playlist_id: &str,
) -> Result<PlaylistView> {
  let playlist_id = Id::parse(playlist_id)?;
  compose_one(store, &playlist_spec(), playlist_id).await
}
