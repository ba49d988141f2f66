//! Handlers for `/playlists` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/playlists/{id}` | 404 if not found |
//! | `POST`   | `/playlists/{id}/videos/{video_id}` | owner only |
//! | `DELETE` | `/playlists/{id}/videos/{video_id}` | owner only |

use axum::extract::{Path, State};
use reel_core::{
  playlist::{self, Membership},
  store::DocumentStore,
  views::{self, PlaylistView},
};

use crate::{ApiResponse, ApiState, CurrentActor, error::ApiResult};

/// `GET /playlists/{id}`
pub async fn get_one<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Path(playlist_id): Path<String>,
) -> ApiResult<PlaylistView> {
  let playlist = views::playlist_by_id(&*state.store, &playlist_id).await?;
  Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

/// `POST /playlists/{id}/videos/{video_id}`
pub async fn add_video<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path((playlist_id, video_id)): Path<(String, String)>,
) -> ApiResult<Membership> {
  let membership =
    playlist::add_video_to_playlist(&*state.store, &playlist_id, &video_id, actor).await?;
  let message = if membership.changed {
    "Video added to playlist"
  } else {
    "Video already in playlist"
  };
  Ok(ApiResponse::ok(membership, message))
}

/// `DELETE /playlists/{id}/videos/{video_id}`
pub async fn remove_video<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path((playlist_id, video_id)): Path<(String, String)>,
) -> ApiResult<Membership> {
  let membership =
    playlist::remove_video_from_playlist(&*state.store, &playlist_id, &video_id, actor).await?;
  let message = if membership.changed {
    "Video removed from playlist"
  } else {
    "Video was not in playlist"
  };
  Ok(ApiResponse::ok(membership, message))
}
