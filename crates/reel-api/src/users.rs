//! Per-user and per-channel listings.

use axum::extract::{Path, State};
use reel_core::{
  store::DocumentStore,
  views::{
    self, LikedVideoView, PlaylistView, SubscribedChannelView, SubscriberView, TweetView,
  },
};

use crate::{ApiResponse, ApiState, CurrentActor, error::ApiResult};

/// `GET /users/{id}/tweets`
pub async fn tweets<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(user_id): Path<String>,
) -> ApiResult<Vec<TweetView>> {
  let tweets = views::user_tweets(&*state.store, &user_id, actor).await?;
  Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

/// `GET /users/{id}/subscriptions`
pub async fn subscribed_channels<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Path(user_id): Path<String>,
) -> ApiResult<Vec<SubscribedChannelView>> {
  let channels = views::subscribed_channels(&*state.store, &user_id).await?;
  Ok(ApiResponse::ok(channels, "Subscribed channels fetched successfully"))
}

/// `GET /users/{id}/playlists`
pub async fn playlists<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Path(user_id): Path<String>,
) -> ApiResult<Vec<PlaylistView>> {
  let playlists = views::user_playlists(&*state.store, &user_id).await?;
  Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}

/// `GET /channels/{id}/subscribers`
pub async fn subscribers<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Path(channel_id): Path<String>,
) -> ApiResult<Vec<SubscriberView>> {
  let subscribers = views::channel_subscribers(&*state.store, &channel_id).await?;
  Ok(ApiResponse::ok(subscribers, "Subscribers fetched successfully"))
}

/// `GET /likes/videos`: the current actor's liked videos.
pub async fn liked_videos<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
) -> ApiResult<Vec<LikedVideoView>> {
  let videos = views::liked_videos(&*state.store, actor).await?;
  Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
