//! Integration tests for `SqliteStore` and the engines running on it, against
//! an in-memory database.

use std::{
  io,
  path::PathBuf,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, Duration, Utc};
use reel_core::{
  Collection, Document, Error as CoreError, Id,
  document::to_document,
  filter::Filter,
  media::{
    BlobStore, NewVideo, StoredBlob, VideoUpdate, delete_video, publish_video, update_video,
  },
  model::{Comment, Like, Playlist, SubjectKind, Tweet, User, Video},
  page::{Page, PageRequest},
  pipeline::{SortDirection, Stage},
  playlist::{add_video_to_playlist, remove_video_from_playlist},
  search::{SortKey, VideoQuery, search_videos},
  stats::{ChannelStats, channel_stats},
  store::{DocumentStore, insert_record},
  toggle::{ToggleState, toggle_like, toggle_subscription},
  views,
};
use serde_json::json;

use crate::SqliteStore;

// ─── Fixtures ────────────────────────────────────────────────────────────────

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn epoch() -> DateTime<Utc> {
  DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
    .unwrap()
    .with_timezone(&Utc)
}

async fn user(s: &SqliteStore, name: &str) -> User {
  let user = User::new(name, format!("{name} Example"), format!("{name}@example.com"));
  assert!(insert_record(s, &user).await.unwrap());
  user
}

async fn video(s: &SqliteStore, owner: &User, title: &str) -> Video {
  let video = Video::new(owner.id, title, format!("all about {title}"));
  assert!(insert_record(s, &video).await.unwrap());
  video
}

/// A video created `minutes` after [`epoch`] with `views` views.
async fn video_at(
  s: &SqliteStore,
  owner: &User,
  title: &str,
  minutes: i64,
  views: u64,
) -> Video {
  let mut video = Video::new(owner.id, title, "");
  video.created_at = epoch() + Duration::minutes(minutes);
  video.view_count = views;
  assert!(insert_record(s, &video).await.unwrap());
  video
}

async fn like(s: &SqliteStore, kind: SubjectKind, subject: Id, actor: &User) {
  assert!(insert_record(s, &Like::new(kind, subject, actor.id)).await.unwrap());
}

async fn count(s: &SqliteStore, collection: Collection, filter: Filter) -> usize {
  s.find(collection, filter).await.unwrap().len()
}

/// Delegates to a [`SqliteStore`], counting pipeline runs and optionally
/// refusing every insert as if it had hit a uniqueness constraint.
struct Instrumented {
  inner:          SqliteStore,
  pipelines:      AtomicUsize,
  reject_inserts: bool,
}

impl Instrumented {
  fn new(inner: SqliteStore) -> Self {
    Self { inner, pipelines: AtomicUsize::new(0), reject_inserts: false }
  }
}

impl DocumentStore for Instrumented {
  type Error = crate::Error;

  async fn find_by_id(&self, c: Collection, id: Id) -> crate::Result<Option<Document>> {
    self.inner.find_by_id(c, id).await
  }

  async fn find(&self, c: Collection, filter: Filter) -> crate::Result<Vec<Document>> {
    self.inner.find(c, filter).await
  }

  async fn insert(&self, c: Collection, doc: Document) -> crate::Result<bool> {
    if self.reject_inserts {
      return Ok(false);
    }
    self.inner.insert(c, doc).await
  }

  async fn update_by_id(
    &self,
    c: Collection,
    id: Id,
    patch: Document,
  ) -> crate::Result<Option<Document>> {
    self.inner.update_by_id(c, id, patch).await
  }

  async fn delete_by_id(&self, c: Collection, id: Id) -> crate::Result<bool> {
    self.inner.delete_by_id(c, id).await
  }

  async fn run_pipeline(&self, c: Collection, stages: Vec<Stage>) -> crate::Result<Vec<Document>> {
    self.pipelines.fetch_add(1, Ordering::SeqCst);
    self.inner.run_pipeline(c, stages).await
  }

  async fn paginate(
    &self,
    c: Collection,
    stages: Vec<Stage>,
    page: PageRequest,
  ) -> crate::Result<Page<Document>> {
    self.pipelines.fetch_add(1, Ordering::SeqCst);
    self.inner.paginate(c, stages, page).await
  }
}

/// Records uploads and removals; can be told to fail thumbnail uploads.
#[derive(Default)]
struct FakeBlobs {
  stored:          Mutex<Vec<String>>,
  removed:         Mutex<Vec<String>>,
  fail_thumbnails: bool,
}

impl BlobStore for FakeBlobs {
  type Error = io::Error;

  async fn store(&self, local_path: PathBuf) -> Result<StoredBlob, io::Error> {
    let name = local_path.to_string_lossy().into_owned();
    if self.fail_thumbnails && name.ends_with(".png") {
      return Err(io::Error::other("upload failed"));
    }
    let url = format!("https://blobs.test/{name}");
    self.stored.lock().unwrap().push(url.clone());
    Ok(StoredBlob { url, duration_seconds: name.ends_with(".mp4").then_some(12.5) })
  }

  async fn remove(&self, url: String) -> Result<bool, io::Error> {
    self.removed.lock().unwrap().push(url);
    Ok(true)
  }
}

fn upload(title: &str) -> NewVideo {
  NewVideo {
    title:          title.into(),
    description:    "a description".into(),
    media_path:     "clip.mp4".into(),
    thumbnail_path: "thumb.png".into(),
  }
}

// ─── Document store ──────────────────────────────────────────────────────────

#[tokio::test]
async fn find_by_id_round_trips_and_misses() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  let doc = s.find_by_id(Collection::Users, ada.id).await.unwrap().unwrap();
  assert_eq!(doc["username"], "ada");

  assert!(s.find_by_id(Collection::Users, Id::new()).await.unwrap().is_none());
  assert!(s.find_by_id(Collection::Videos, ada.id).await.unwrap().is_none());
}

#[tokio::test]
async fn insert_with_existing_id_is_rejected() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  assert!(!insert_record(&s, &ada).await.unwrap());
}

#[tokio::test]
async fn update_merges_shallowly_and_keeps_the_id() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let v = video(&s, &ada, "draft").await;

  let patch = to_document(&json!({ "title": "final", "id": Id::new() })).unwrap();
  let updated = s.update_by_id(Collection::Videos, v.id, patch).await.unwrap().unwrap();
  assert_eq!(updated["title"], "final");
  assert_eq!(updated["description"], "all about draft");
  assert_eq!(updated["id"], json!(v.id));

  let reloaded = s.find_by_id(Collection::Videos, v.id).await.unwrap().unwrap();
  assert_eq!(reloaded, updated);

  let missing = s.update_by_id(Collection::Videos, Id::new(), Document::new()).await.unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn delete_reports_whether_a_row_went_away() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  assert!(s.delete_by_id(Collection::Users, ada.id).await.unwrap());
  assert!(!s.delete_by_id(Collection::Users, ada.id).await.unwrap());
}

#[tokio::test]
async fn find_keeps_insertion_order_and_matches_array_members() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let first = video(&s, &ada, "one").await;
  let second = video(&s, &ada, "two").await;

  let mut playlist = Playlist::new(ada.id, "mix", "");
  playlist.video_ids = vec![second.id, first.id];
  insert_record(&s, &playlist).await.unwrap();

  let videos = s.find(Collection::Videos, Filter::eq("owner_id", ada.id)).await.unwrap();
  let titles: Vec<_> = videos.iter().map(|d| d["title"].as_str().unwrap()).collect();
  assert_eq!(titles, ["one", "two"]);

  let containing = s.find(Collection::Playlists, Filter::eq("video_ids", first.id)).await.unwrap();
  assert_eq!(containing.len(), 1);
}

#[tokio::test]
async fn duplicate_like_rows_violate_the_relation_index() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let v = video(&s, &ada, "clip").await;

  like(&s, SubjectKind::Video, v.id, &ada).await;
  let again = Like::new(SubjectKind::Video, v.id, ada.id);
  assert!(!insert_record(&s, &again).await.unwrap());

  // Same subject id under a different kind is a different relation.
  let other_kind = Like::new(SubjectKind::Comment, v.id, ada.id);
  assert!(insert_record(&s, &other_kind).await.unwrap());
}

// ─── Relation toggle ─────────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_alternates_added_and_removed() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let v = video(&s, &ada, "clip").await;
  let vid = v.id.to_string();

  let mut states = Vec::new();
  for _ in 0..3 {
    let toggled = toggle_like(&s, SubjectKind::Video, &vid, Some(bob.id)).await.unwrap();
    states.push(toggled.state);
  }
  assert_eq!(states, [ToggleState::Added, ToggleState::Removed, ToggleState::Added]);
  assert_eq!(count(&s, Collection::Likes, Filter::eq("actor_id", bob.id)).await, 1);
}

#[tokio::test]
async fn toggle_returns_the_created_relation() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let t = Tweet::new(ada.id, "hello");
  insert_record(&s, &t).await.unwrap();

  let toggled = toggle_like(&s, SubjectKind::Tweet, &t.id.to_string(), Some(ada.id))
    .await
    .unwrap();
  let relation = serde_json::to_value(toggled.relation.unwrap()).unwrap();
  assert_eq!(relation["subject_kind"], "tweet");
  assert_eq!(relation["subject_id"], json!(t.id));
}

#[tokio::test]
async fn toggle_rejects_bad_input() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  let err = toggle_like(&s, SubjectKind::Video, "not-an-id", Some(ada.id)).await.unwrap_err();
  assert!(matches!(err, CoreError::InvalidReference(_)));

  let v = video(&s, &ada, "clip").await;
  let err = toggle_like(&s, SubjectKind::Video, &v.id.to_string(), None).await.unwrap_err();
  assert!(matches!(err, CoreError::Unauthorized(_)));

  let err = toggle_like(&s, SubjectKind::Comment, &v.id.to_string(), Some(ada.id))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound { collection: Collection::Comments, .. }));
}

#[tokio::test]
async fn self_subscription_is_rejected() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let err = toggle_subscription(&s, &ada.id.to_string(), Some(ada.id)).await.unwrap_err();
  assert!(matches!(err, CoreError::SelfSubscription));
  assert_eq!(count(&s, Collection::Subscriptions, Filter::All).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_never_duplicate_the_relation() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let v = video(&s, &ada, "clip").await;

  let mut handles = Vec::new();
  for _ in 0..6 {
    let s = s.clone();
    let vid = v.id.to_string();
    let actor = bob.id;
    handles.push(tokio::spawn(async move {
      toggle_like(&s, SubjectKind::Video, &vid, Some(actor)).await
    }));
  }

  let mut net = 0_i64;
  for handle in handles {
    match handle.await.unwrap().unwrap().state {
      ToggleState::Added => net += 1,
      ToggleState::Removed => net -= 1,
    }
  }

  let rows = count(&s, Collection::Likes, Filter::eq("subject_id", v.id)).await as i64;
  assert!(rows <= 1);
  assert_eq!(net, rows);
}

#[tokio::test]
async fn subscribe_then_list_both_directions() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;

  let toggled = toggle_subscription(&s, &ada.id.to_string(), Some(bob.id)).await.unwrap();
  assert_eq!(toggled.state, ToggleState::Added);

  let subscribers = views::channel_subscribers(&s, &ada.id.to_string()).await.unwrap();
  assert_eq!(subscribers.len(), 1);
  assert_eq!(subscribers[0].subscriber.as_ref().unwrap().username.as_deref(), Some("bob"));

  let channels = views::subscribed_channels(&s, &bob.id.to_string()).await.unwrap();
  assert_eq!(channels[0].channel.as_ref().unwrap().id, ada.id);

  let toggled = toggle_subscription(&s, &ada.id.to_string(), Some(bob.id)).await.unwrap();
  assert_eq!(toggled.state, ToggleState::Removed);
  assert!(views::channel_subscribers(&s, &ada.id.to_string()).await.unwrap().is_empty());
}

// ─── Views ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn is_liked_is_relative_to_the_viewer() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let v = video(&s, &ada, "clip").await;
  like(&s, SubjectKind::Video, v.id, &ada).await;
  // A comment like on the same id must not count towards the video.
  like(&s, SubjectKind::Comment, v.id, &bob).await;

  let vid = v.id.to_string();
  let as_ada = views::video_detail(&s, &vid, Some(ada.id)).await.unwrap();
  let as_bob = views::video_detail(&s, &vid, Some(bob.id)).await.unwrap();
  let anonymous = views::video_detail(&s, &vid, None).await.unwrap();

  assert!(as_ada.is_liked);
  assert!(!as_bob.is_liked);
  assert!(!anonymous.is_liked);
  assert_eq!(as_ada.likes_count, 1);
  assert_eq!(as_ada.owner.unwrap().email.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn detail_of_missing_video_is_not_found() {
  let s = store().await;
  let missing = Id::new();
  let err = views::video_detail(&s, &missing.to_string(), None).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound { collection: Collection::Videos, id } if id == missing));
}

#[tokio::test]
async fn detail_with_deleted_owner_has_null_owner() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let v = video(&s, &ada, "clip").await;
  s.delete_by_id(Collection::Users, ada.id).await.unwrap();

  let detail = views::video_detail(&s, &v.id.to_string(), None).await.unwrap();
  assert!(detail.owner.is_none());
}

#[tokio::test]
async fn sparse_owner_documents_still_decode() {
  let s = store().await;
  let owner_id = Id::new();
  let sparse = to_document(&json!({
    "id": owner_id,
    "username": "quiet",
    "created_at": epoch(),
  }))
  .unwrap();
  assert!(s.insert(Collection::Users, sparse).await.unwrap());
  let v = Video::new(owner_id, "clip", "");
  assert!(insert_record(&s, &v).await.unwrap());

  let detail = views::video_detail(&s, &v.id.to_string(), None).await.unwrap();
  let owner = detail.owner.unwrap();
  assert_eq!(owner.username.as_deref(), Some("quiet"));
  assert!(owner.avatar_url.is_none());
  assert!(owner.email.is_none());

  let page = search_videos(&s, &VideoQuery::default()).await.unwrap();
  let summary_owner = page.items[0].owner.as_ref().unwrap();
  assert_eq!(summary_owner.id, owner_id);
  assert!(summary_owner.full_name.is_none());
}

#[tokio::test]
async fn comment_view_projects_only_public_owner_fields() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let v = video(&s, &ada, "clip").await;
  insert_record(&s, &Comment::new(v.id, ada.id, "first!")).await.unwrap();

  let spec = views::video_comments_spec(v.id, None);
  let raw = s.run_pipeline(spec.base, spec.stages()).await.unwrap();
  let owner = raw[0]["owner"].as_object().unwrap();
  let mut keys: Vec<_> = owner.keys().map(String::as_str).collect();
  keys.sort_unstable();
  assert_eq!(keys, ["avatar_url", "full_name", "id", "username"]);
  assert!(!raw[0].contains_key("likes"));
  assert!(!raw[0].contains_key("video_id"));
}

#[tokio::test]
async fn comments_are_paginated_newest_first() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let v = video(&s, &ada, "clip").await;

  let mut ids = Vec::new();
  for i in 0..3 {
    let mut c = Comment::new(v.id, ada.id, format!("comment {i}"));
    c.created_at = epoch() + Duration::minutes(i);
    insert_record(&s, &c).await.unwrap();
    ids.push(c.id);
  }
  like(&s, SubjectKind::Comment, ids[2], &bob).await;

  let page = views::video_comments(&s, &v.id.to_string(), Some(bob.id), PageRequest::new(1, 2))
    .await
    .unwrap();
  assert_eq!(page.total_items, 3);
  assert_eq!(page.total_pages, 2);
  assert_eq!(page.items[0].content, "comment 2");
  assert!(page.items[0].is_liked);
  assert_eq!(page.items[0].likes_count, 1);
  assert_eq!(page.items[1].content, "comment 1");
  assert!(!page.items[1].is_liked);
}

#[tokio::test]
async fn comments_of_missing_video_are_not_found() {
  let s = store().await;
  let err = views::video_comments(&s, &Id::new().to_string(), None, PageRequest::default())
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NotFound { .. }));
}

#[tokio::test]
async fn user_tweets_include_owner_contact_and_likes() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let t = Tweet::new(ada.id, "hello");
  insert_record(&s, &t).await.unwrap();
  insert_record(&s, &Tweet::new(bob.id, "not ada")).await.unwrap();
  like(&s, SubjectKind::Tweet, t.id, &bob).await;

  let tweets = views::user_tweets(&s, &ada.id.to_string(), Some(bob.id)).await.unwrap();
  assert_eq!(tweets.len(), 1);
  assert_eq!(tweets[0].likes_count, 1);
  assert!(tweets[0].is_liked);
  assert_eq!(tweets[0].owner.as_ref().unwrap().email.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn liked_videos_skip_deleted_videos() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let kept = video(&s, &ada, "kept").await;
  let gone = video(&s, &ada, "gone").await;
  like(&s, SubjectKind::Video, kept.id, &bob).await;
  like(&s, SubjectKind::Video, gone.id, &bob).await;
  s.delete_by_id(Collection::Videos, gone.id).await.unwrap();

  let liked = views::liked_videos(&s, Some(bob.id)).await.unwrap();
  assert_eq!(liked.len(), 1);
  assert_eq!(liked[0].video.title, "kept");
  assert_eq!(liked[0].video.owner.as_ref().unwrap().username.as_deref(), Some("ada"));

  assert!(matches!(views::liked_videos(&s, None).await, Err(CoreError::Unauthorized(_))));
}

#[tokio::test]
async fn playlist_view_keeps_playlist_order() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let a = video(&s, &ada, "a").await;
  let b = video(&s, &ada, "b").await;
  let c = video(&s, &ada, "c").await;

  let mut playlist = Playlist::new(ada.id, "mix", "favourites");
  playlist.video_ids = vec![c.id, a.id, b.id];
  insert_record(&s, &playlist).await.unwrap();

  let view = views::playlist_by_id(&s, &playlist.id.to_string()).await.unwrap();
  let titles: Vec<_> = view.videos.iter().map(|v| v.title.as_str()).collect();
  assert_eq!(titles, ["c", "a", "b"]);
  assert_eq!(view.total_videos, 3);
  assert_eq!(view.owner.unwrap().username.as_deref(), Some("ada"));

  let all = views::user_playlists(&s, &ada.id.to_string()).await.unwrap();
  assert_eq!(all.len(), 1);

  let err = views::playlist_by_id(&s, &Id::new().to_string()).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound { collection: Collection::Playlists, .. }));
}

#[tokio::test]
async fn channel_videos_include_unpublished() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let mut hidden = Video::new(ada.id, "hidden", "");
  hidden.is_published = false;
  insert_record(&s, &hidden).await.unwrap();
  video(&s, &ada, "public").await;

  let videos = views::channel_videos(&s, Some(ada.id)).await.unwrap();
  assert_eq!(videos.len(), 2);
  assert!(videos.iter().any(|v| !v.is_published));
}

// ─── Playlist membership ─────────────────────────────────────────────────────

#[tokio::test]
async fn adding_twice_is_a_no_op() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let v = video(&s, &ada, "clip").await;
  let playlist = Playlist::new(ada.id, "mix", "");
  insert_record(&s, &playlist).await.unwrap();
  let (pid, vid) = (playlist.id.to_string(), v.id.to_string());

  let first = add_video_to_playlist(&s, &pid, &vid, Some(ada.id)).await.unwrap();
  assert!(first.changed);
  let second = add_video_to_playlist(&s, &pid, &vid, Some(ada.id)).await.unwrap();
  assert!(!second.changed);
  assert_eq!(second.playlist.video_ids, vec![v.id]);

  let removed = remove_video_from_playlist(&s, &pid, &vid, Some(ada.id)).await.unwrap();
  assert!(removed.changed);
  assert!(removed.playlist.video_ids.is_empty());
  let again = remove_video_from_playlist(&s, &pid, &vid, Some(ada.id)).await.unwrap();
  assert!(!again.changed);
}

#[tokio::test]
async fn only_the_owner_edits_a_playlist() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let v = video(&s, &ada, "clip").await;
  let playlist = Playlist::new(ada.id, "mix", "");
  insert_record(&s, &playlist).await.unwrap();

  let err = add_video_to_playlist(&s, &playlist.id.to_string(), &v.id.to_string(), Some(bob.id))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Unauthorized(_)));

  let err =
    add_video_to_playlist(&s, &playlist.id.to_string(), &Id::new().to_string(), Some(ada.id))
      .await
      .unwrap_err();
  assert!(matches!(err, CoreError::NotFound { collection: Collection::Videos, .. }));
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_pages_report_totals_from_candidates() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  for i in 0..25 {
    video_at(&s, &ada, &format!("video {i}"), i, 0).await;
  }

  let page = |n| VideoQuery { page: PageRequest::new(n, 10), ..Default::default() };

  let first = search_videos(&s, &page(1)).await.unwrap();
  assert_eq!((first.items.len(), first.total_items, first.total_pages), (10, 25, 3));
  assert_eq!(first.items[0].title, "video 24");
  assert_eq!(first.items[0].owner.as_ref().unwrap().username.as_deref(), Some("ada"));

  let third = search_videos(&s, &page(3)).await.unwrap();
  assert_eq!(third.items.len(), 5);
  assert_eq!(third.items[4].title, "video 0");

  let fourth = search_videos(&s, &page(4)).await.unwrap();
  assert!(fourth.items.is_empty());
  assert_eq!(fourth.total_items, 25);
}

#[tokio::test]
async fn empty_search_skips_enrichment() {
  let s = Instrumented::new(store().await);
  let ada = user(&s.inner, "ada").await;
  video(&s.inner, &ada, "rust ownership").await;

  let query =
    VideoQuery { text: Some("nonexistent-title-xyz".into()), ..Default::default() };
  let page = search_videos(&s, &query).await.unwrap();

  assert!(page.items.is_empty());
  assert_eq!((page.total_items, page.total_pages), (0, 0));
  assert_eq!(s.pipelines.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_page_size_falls_back_to_the_default() {
  let s = store().await;
  let zero: PageRequest = serde_json::from_value(json!({ "page": 1, "page_size": 0 })).unwrap();

  let empty = search_videos(&s, &VideoQuery { page: zero, ..Default::default() }).await.unwrap();
  assert_eq!((empty.page_size, empty.total_pages), (10, 0));

  let ada = user(&s, "ada").await;
  for n in 0..12 {
    video_at(&s, &ada, &format!("clip {n}"), n, 0).await;
  }
  let page = search_videos(&s, &VideoQuery { page: zero, ..Default::default() }).await.unwrap();
  assert_eq!(page.items.len(), 10);
  assert_eq!((page.total_items, page.total_pages), (12, 2));
}

#[tokio::test]
async fn search_filters_sorts_and_hides_unpublished() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  video_at(&s, &ada, "Rust basics", 0, 30).await;
  video_at(&s, &ada, "rust advanced", 1, 10).await;
  video_at(&s, &bob, "Rust by bob", 2, 20).await;
  video_at(&s, &ada, "Cooking pasta", 3, 99).await;
  let mut draft = Video::new(ada.id, "rust draft", "");
  draft.is_published = false;
  insert_record(&s, &draft).await.unwrap();

  let query = VideoQuery {
    text: Some("RUST".into()),
    sort_key: SortKey::ViewCount,
    direction: SortDirection::Asc,
    ..Default::default()
  };
  let titles: Vec<String> = search_videos(&s, &query)
    .await
    .unwrap()
    .items
    .into_iter()
    .map(|v| v.title)
    .collect();
  assert_eq!(titles, ["rust advanced", "Rust by bob", "Rust basics"]);

  let query = VideoQuery { owner_id: Some(bob.id), ..query };
  let page = search_videos(&s, &query).await.unwrap();
  assert_eq!(page.total_items, 1);
  assert_eq!(page.items[0].title, "Rust by bob");
}

#[tokio::test]
async fn sort_ties_keep_insertion_order() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  for title in ["first", "second", "third"] {
    video_at(&s, &ada, title, 0, 7).await;
  }

  let query = VideoQuery { sort_key: SortKey::ViewCount, ..Default::default() };
  let titles: Vec<String> = search_videos(&s, &query)
    .await
    .unwrap()
    .items
    .into_iter()
    .map(|v| v.title)
    .collect();
  assert_eq!(titles, ["first", "second", "third"]);
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_without_videos_are_zero_except_subscribers() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  assert_eq!(channel_stats(&s, ada.id).await.unwrap(), ChannelStats::default());

  let bob = user(&s, "bob").await;
  toggle_subscription(&s, &ada.id.to_string(), Some(bob.id)).await.unwrap();
  let stats = channel_stats(&s, ada.id).await.unwrap();
  assert_eq!(stats.total_videos, 0);
  assert_eq!(stats.total_subscribers, 1);
}

#[tokio::test]
async fn stats_count_subscribers_once_and_only_video_likes() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let cy = user(&s, "cy").await;
  let a = video_at(&s, &ada, "a", 0, 5).await;
  let b = video_at(&s, &ada, "b", 1, 7).await;
  video_at(&s, &bob, "not ada's", 2, 100).await;

  like(&s, SubjectKind::Video, a.id, &bob).await;
  like(&s, SubjectKind::Video, a.id, &cy).await;
  like(&s, SubjectKind::Video, b.id, &bob).await;
  like(&s, SubjectKind::Comment, b.id, &cy).await;
  for fan in [&bob, &cy] {
    toggle_subscription(&s, &ada.id.to_string(), Some(fan.id)).await.unwrap();
  }

  let stats = channel_stats(&s, ada.id).await.unwrap();
  assert_eq!(stats, ChannelStats {
    total_views:       12,
    total_videos:      2,
    total_likes:       3,
    total_subscribers: 2,
  });
}

// ─── Media ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn publish_stores_blobs_and_a_public_video() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let blobs = FakeBlobs::default();

  let v = publish_video(&s, &blobs, Some(ada.id), upload("intro")).await.unwrap();
  assert!(v.is_published);
  assert_eq!(v.media_url, "https://blobs.test/clip.mp4");
  assert_eq!(v.duration_seconds, 12.5);
  assert!(s.find_by_id(Collection::Videos, v.id).await.unwrap().is_some());
  assert!(blobs.removed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn publish_removes_blobs_when_the_insert_does_not_take() {
  let mut s = Instrumented::new(store().await);
  s.reject_inserts = true;
  let blobs = FakeBlobs::default();

  let err = publish_video(&s, &blobs, Some(Id::new()), upload("intro")).await.unwrap_err();
  assert!(matches!(err, CoreError::Persistence(_)));

  let mut stored = blobs.stored.lock().unwrap().clone();
  let mut removed = blobs.removed.lock().unwrap().clone();
  stored.sort();
  removed.sort();
  assert_eq!(stored.len(), 2);
  assert_eq!(stored, removed);
}

#[tokio::test]
async fn publish_validates_before_uploading() {
  let s = store().await;
  let blobs = FakeBlobs::default();

  let err = publish_video(&s, &blobs, Some(Id::new()), upload("  ")).await.unwrap_err();
  assert!(matches!(err, CoreError::Validation(_)));
  let err = publish_video(&s, &blobs, None, upload("intro")).await.unwrap_err();
  assert!(matches!(err, CoreError::Unauthorized(_)));
  assert!(blobs.stored.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_thumbnail_upload_removes_the_media_blob() {
  let s = store().await;
  let blobs = FakeBlobs { fail_thumbnails: true, ..Default::default() };

  let err = publish_video(&s, &blobs, Some(Id::new()), upload("intro")).await.unwrap_err();
  assert!(matches!(err, CoreError::Blob(_)));
  assert_eq!(*blobs.removed.lock().unwrap(), ["https://blobs.test/clip.mp4"]);
  assert_eq!(count(&s, Collection::Videos, Filter::All).await, 0);
}

#[tokio::test]
async fn update_replaces_the_thumbnail_and_drops_the_old_one() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let blobs = FakeBlobs::default();
  let v = publish_video(&s, &blobs, Some(ada.id), upload("intro")).await.unwrap();

  let edit = VideoUpdate {
    title:          "intro, revised".into(),
    description:    "now with sound".into(),
    thumbnail_path: Some("new-thumb.jpg".into()),
  };
  let updated = update_video(&s, &blobs, Some(ada.id), &v.id.to_string(), edit.clone())
    .await
    .unwrap();
  assert_eq!(updated.title, "intro, revised");
  assert_eq!(updated.thumbnail_url, "https://blobs.test/new-thumb.jpg");
  assert_eq!(*blobs.removed.lock().unwrap(), ["https://blobs.test/thumb.png"]);

  let bob = user(&s, "bob").await;
  let err = update_video(&s, &blobs, Some(bob.id), &v.id.to_string(), edit).await.unwrap_err();
  assert!(matches!(err, CoreError::Unauthorized(_)));
}

#[tokio::test]
async fn delete_removes_the_document_then_its_blobs() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let blobs = FakeBlobs::default();
  let v = publish_video(&s, &blobs, Some(ada.id), upload("intro")).await.unwrap();
  let vid = v.id.to_string();

  let err = delete_video(&s, &blobs, Some(bob.id), &vid).await.unwrap_err();
  assert!(matches!(err, CoreError::Unauthorized(_)));
  assert!(blobs.removed.lock().unwrap().is_empty());

  let deleted = delete_video(&s, &blobs, Some(ada.id), &vid).await.unwrap();
  assert_eq!(deleted.id, v.id);
  assert!(s.find_by_id(Collection::Videos, v.id).await.unwrap().is_none());
  assert_eq!(
    *blobs.removed.lock().unwrap(),
    ["https://blobs.test/clip.mp4", "https://blobs.test/thumb.png"]
  );

  let err = delete_video(&s, &blobs, Some(ada.id), &vid).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound { .. }));
}
