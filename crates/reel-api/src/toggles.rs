//! Handlers for the like and subscription toggles.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/videos/{id}/like` | |
//! | `POST` | `/comments/{id}/like` | |
//! | `POST` | `/tweets/{id}/like` | |
//! | `POST` | `/channels/{id}/subscription` | 400 when subscribing to oneself |

use axum::extract::{Path, State};
use reel_core::{
  model::SubjectKind,
  store::DocumentStore,
  toggle::{self, ToggleState, Toggled},
};

use crate::{ApiResponse, ApiState, CurrentActor, error::ApiResult};

async fn like<S: DocumentStore>(
  state: &ApiState<S>,
  kind: SubjectKind,
  id: &str,
  actor: CurrentActor,
) -> ApiResult<Toggled> {
  let toggled = toggle::toggle_like(&*state.store, kind, id, actor.0).await?;
  let message = match toggled.state {
    ToggleState::Added => "Like added successfully",
    ToggleState::Removed => "Like removed successfully",
  };
  Ok(ApiResponse::ok(toggled, message))
}

/// `POST /videos/{id}/like`
pub async fn video_like<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  actor: CurrentActor,
  Path(id): Path<String>,
) -> ApiResult<Toggled> {
  like(&state, SubjectKind::Video, &id, actor).await
}

/// `POST /comments/{id}/like`
pub async fn comment_like<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  actor: CurrentActor,
  Path(id): Path<String>,
) -> ApiResult<Toggled> {
  like(&state, SubjectKind::Comment, &id, actor).await
}

/// `POST /tweets/{id}/like`
pub async fn tweet_like<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  actor: CurrentActor,
  Path(id): Path<String>,
) -> ApiResult<Toggled> {
  like(&state, SubjectKind::Tweet, &id, actor).await
}

/// `POST /channels/{id}/subscription`
pub async fn subscription<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(channel_id): Path<String>,
) -> ApiResult<Toggled> {
  let toggled = toggle::toggle_subscription(&*state.store, &channel_id, actor).await?;
  let message = match toggled.state {
    ToggleState::Added => "Subscribed successfully",
    ToggleState::Removed => "Unsubscribed successfully",
  };
  Ok(ApiResponse::ok(toggled, message))
}
