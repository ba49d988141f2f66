//! Playlist membership edits.
//!
//! A playlist holds each video at most once. Adding a video already present,
//! or removing one that is absent, is a no-op reported as `changed: false`.
//! The edit is a read-modify-write of `video_ids`; two concurrent edits of the
//! same playlist may lose one of them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  Collection, Document, Error, Id, Record, Result,
  model::Playlist,
  store::{self, DocumentStore},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
  pub changed:  bool,
  pub playlist: Playlist,
}

/// Load a playlist the actor is allowed to edit.
async fn owned_playlist<S: DocumentStore>(
  store: &S,
  playlist_id: Id,
  actor: Option<Id>,
) -> Result<Playlist> {
  let actor = actor.ok_or_else(Error::no_actor)?;
  let playlist: Playlist = store::require(store, playlist_id).await?;
  if playlist.owner_id != actor {
    return Err(Error::Unauthorized(format!(
      "playlist {playlist_id} belongs to another user"
    )));
  }
  Ok(playlist)
}

async fn save_videos<S: DocumentStore>(store: &S, playlist: Playlist) -> Result<Playlist> {
  let mut patch = Document::new();
  patch.insert("video_ids".to_owned(), serde_json::to_value(&playlist.video_ids)?);
  match store
    .update_by_id(Collection::Playlists, playlist.id, patch)
    .await
    .map_err(Error::store)?
  {
    Some(doc) => Playlist::from_document(doc),
    None => Err(Error::not_found(Collection::Playlists, playlist.id)),
  }
}

pub async fn add_video_to_playlist<S: DocumentStore>(
  store: &S,
  playlist_id: &str,
  video_id: &str,
  actor: Option<Id>,
) -> Result<Membership> {
  let playlist_id = Id::parse(playlist_id)?;
  let video_id = Id::parse(video_id)?;
  let mut playlist = owned_playlist(store, playlist_id, actor).await?;

  if !store::exists(store, Collection::Videos, video_id).await? {
    return Err(Error::not_found(Collection::Videos, video_id));
  }
  if playlist.video_ids.contains(&video_id) {
    debug!(%playlist_id, %video_id, "video already in playlist");
    return Ok(Membership { changed: false, playlist });
  }

  playlist.video_ids.push(video_id);
  let playlist = save_videos(store, playlist).await?;
  debug!(%playlist_id, %video_id, "video added to playlist");
  Ok(Membership { changed: true, playlist })
}

/// The video need not exist any more, so dangling entries can be cleaned
/// up.
pub async fn remove_video_from_playlist<S: DocumentStore>(
  store: &S,
  playlist_id: &str,
  video_id: &str,
  actor: Option<Id>,
) -> Result<Membership> {
  let playlist_id = Id::parse(playlist_id)?;
  let video_id = Id::parse(video_id)?;
  let mut playlist = owned_playlist(store, playlist_id, actor).await?;

  let before = playlist.video_ids.len();
  playlist.video_ids.retain(|id| *id != video_id);
  if playlist.video_ids.len() == before {
    return Ok(Membership { changed: false, playlist });
  }

  let playlist = save_videos(store, playlist).await?;
  debug!(%playlist_id, %video_id, "video removed from playlist");
  Ok(Membership { changed: true, playlist })
}
