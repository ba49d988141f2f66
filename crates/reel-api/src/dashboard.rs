//! The current actor's channel dashboard.

use axum::extract::State;
use reel_core::{
  stats::{self, ChannelStats},
  store::DocumentStore,
  views::{self, ChannelVideo},
};

use crate::{ApiResponse, ApiState, CurrentActor, error::ApiResult};

/// `GET /dashboard/stats`
pub async fn stats<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
) -> ApiResult<ChannelStats> {
  let stats = stats::dashboard_stats(&*state.store, actor).await?;
  Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

/// `GET /dashboard/videos`
pub async fn videos<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
) -> ApiResult<Vec<ChannelVideo>> {
  let videos = views::channel_videos(&*state.store, actor).await?;
  Ok(ApiResponse::ok(videos, "Channel videos fetched successfully"))
}
