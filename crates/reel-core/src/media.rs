//! Video write paths that involve blob storage.
//!
//! Blob uploads and the document write are not atomic together. When the
//! document write fails, blobs uploaded for it are removed again; a failed
//! removal is logged and otherwise ignored. Deleting a video removes its blobs
//! only after the document is gone.

use std::{future::Future, path::PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  Collection, Document, Error, Id, Record, Result,
  model::Video,
  store::{self, DocumentStore},
};

/// File name endings accepted as video media.
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mpeg-4", "mov"];

// ─── Blob storage ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlob {
  pub url:              String,
  /// Reported for audio/video uploads.
  pub duration_seconds: Option<f64>,
}

/// Binary object storage for media files.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Upload a local file and return where it can be fetched from.
  fn store(
    &self,
    local_path: PathBuf,
  ) -> impl Future<Output = Result<StoredBlob, Self::Error>> + Send + '_;

  /// Returns `true` if a blob was removed.
  fn remove(&self, url: String) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Best-effort removal of a blob no document refers to.
async fn discard<B: BlobStore>(blobs: &B, url: &str) {
  if url.is_empty() {
    return;
  }
  match blobs.remove(url.to_owned()).await {
    Ok(true) => {}
    Ok(false) => warn!(url, "orphaned blob was already gone"),
    Err(err) => warn!(url, error = %err, "failed to remove orphaned blob"),
  }
}

fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  Ok(())
}

// ─── Publish ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewVideo {
  pub title:          String,
  pub description:    String,
  pub media_path:     PathBuf,
  pub thumbnail_path: PathBuf,
}

impl NewVideo {
  fn validate(&self) -> Result<()> {
    require_text("title", &self.title)?;
    require_text("description", &self.description)?;
    let media = self.media_path.to_string_lossy().to_ascii_lowercase();
    if !MEDIA_EXTENSIONS.iter().any(|ext| media.ends_with(ext)) {
      return Err(Error::Validation(format!(
        "media file must be one of {}",
        MEDIA_EXTENSIONS.join(", ")
      )));
    }
    Ok(())
  }
}

/// Upload the media and thumbnail, then record a published video owned by
/// the current actor.
pub async fn publish_video<S, B>(
  store: &S,
  blobs: &B,
  actor: Option<Id>,
  input: NewVideo,
) -> Result<Video>
where
  S: DocumentStore,
  B: BlobStore,
{
  let owner_id = actor.ok_or_else(Error::no_actor)?;
  input.validate()?;

  let media = blobs.store(input.media_path).await.map_err(Error::blob)?;
  let thumbnail = match blobs.store(input.thumbnail_path).await {
    Ok(thumbnail) => thumbnail,
    Err(err) => {
      discard(blobs, &media.url).await;
      return Err(Error::blob(err));
    }
  };

  let mut video = Video::new(owner_id, input.title, input.description);
  video.media_url = media.url;
  video.thumbnail_url = thumbnail.url;
  video.duration_seconds = media.duration_seconds.unwrap_or_default();

  let failure = match store::insert_record(store, &video).await {
    Ok(true) => {
      info!(video_id = %video.id, %owner_id, "video published");
      return Ok(video);
    }
    Ok(false) => Error::Persistence("video insert did not take effect".into()),
    Err(err) => err,
  };

  discard(blobs, &video.thumbnail_url).await;
  discard(blobs, &video.media_url).await;
  Err(failure)
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct VideoUpdate {
  pub title:          String,
  pub description:    String,
  /// Replace the thumbnail when present.
  pub thumbnail_path: Option<PathBuf>,
}

/// Edit the title and description of one of the actor's videos, optionally
/// replacing its thumbnail. The old thumbnail is removed only once the new
/// one is recorded.
pub async fn update_video<S, B>(
  store: &S,
  blobs: &B,
  actor: Option<Id>,
  video_id: &str,
  input: VideoUpdate,
) -> Result<Video>
where
  S: DocumentStore,
  B: BlobStore,
{
  let video_id = Id::parse(video_id)?;
  let actor = actor.ok_or_else(Error::no_actor)?;
  require_text("title", &input.title)?;
  require_text("description", &input.description)?;

  let existing: Video = store::require(store, video_id).await?;
  if existing.owner_id != actor {
    return Err(Error::Unauthorized(format!("video {video_id} belongs to another user")));
  }

  let thumbnail = match input.thumbnail_path {
    Some(path) => Some(blobs.store(path).await.map_err(Error::blob)?),
    None => None,
  };

  let mut patch = Document::new();
  patch.insert("title".to_owned(), input.title.into());
  patch.insert("description".to_owned(), input.description.into());
  if let Some(thumbnail) = &thumbnail {
    patch.insert("thumbnail_url".to_owned(), thumbnail.url.clone().into());
  }

  let updated = store
    .update_by_id(Collection::Videos, video_id, patch)
    .await
    .map_err(Error::store)
    .and_then(|doc| doc.ok_or_else(|| Error::not_found(Collection::Videos, video_id)))
    .and_then(Video::from_document);

  match (updated, thumbnail) {
    (Ok(video), Some(_)) => {
      discard(blobs, &existing.thumbnail_url).await;
      Ok(video)
    }
    (Ok(video), None) => Ok(video),
    (Err(err), Some(thumbnail)) => {
      discard(blobs, &thumbnail.url).await;
      Err(err)
    }
    (Err(err), None) => Err(err),
  }
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// Delete one of the actor's videos, then remove its media and thumbnail
/// blobs. Blob removal is best-effort; the document delete is what counts.
pub async fn delete_video<S, B>(
  store: &S,
  blobs: &B,
  actor: Option<Id>,
  video_id: &str,
) -> Result<Video>
where
  S: DocumentStore,
  B: BlobStore,
{
  let video_id = Id::parse(video_id)?;
  let actor = actor.ok_or_else(Error::no_actor)?;

  let video: Video = store::require(store, video_id).await?;
  if video.owner_id != actor {
    return Err(Error::Unauthorized(format!("video {video_id} belongs to another user")));
  }
  if !store
    .delete_by_id(Collection::Videos, video_id)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::not_found(Collection::Videos, video_id));
  }

  discard(blobs, &video.media_url).await;
  discard(blobs, &video.thumbnail_url).await;
  info!(%video_id, owner_id = %actor, "video deleted");
  Ok(video)
}
