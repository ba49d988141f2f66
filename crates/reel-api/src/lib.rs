//! JSON HTTP API for reel.
//!
//! Exposes an axum [`Router`] backed by any [`DocumentStore`]. Handlers
//! resolve the current actor, call into `reel-core`, and wrap the result in
//! the [`ApiResponse`] envelope. Authentication, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", reel_api::api_router(ApiState::new(store.clone())))
//! ```

pub mod actor;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod playlists;
pub mod toggles;
pub mod users;
pub mod videos;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderName,
  routing::{get, post},
};
use reel_core::store::DocumentStore;

pub use actor::CurrentActor;
pub use envelope::ApiResponse;
pub use error::ApiError;

/// Header carrying the authenticated user id unless configured otherwise.
pub const DEFAULT_ACTOR_HEADER: &str = "x-actor-id";

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:        Arc<S>,
  pub actor_header: HeaderName,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, actor_header: HeaderName::from_static(DEFAULT_ACTOR_HEADER) }
  }

  pub fn with_actor_header(mut self, header: HeaderName) -> Self {
    self.actor_header = header;
    self
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), actor_header: self.actor_header.clone() }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: DocumentStore + 'static,
{
  Router::new()
    // Relation toggles
    .route("/videos/{id}/like", post(toggles::video_like::<S>))
    .route("/comments/{id}/like", post(toggles::comment_like::<S>))
    .route("/tweets/{id}/like", post(toggles::tweet_like::<S>))
    .route("/channels/{id}/subscription", post(toggles::subscription::<S>))
    // Videos
    .route("/videos", get(videos::search::<S>))
    .route("/videos/{id}", get(videos::detail::<S>))
    .route("/videos/{id}/comments", get(videos::comments::<S>))
    // Users and channels
    .route("/users/{id}/tweets", get(users::tweets::<S>))
    .route("/users/{id}/subscriptions", get(users::subscribed_channels::<S>))
    .route("/users/{id}/playlists", get(users::playlists::<S>))
    .route("/channels/{id}/subscribers", get(users::subscribers::<S>))
    .route("/likes/videos", get(users::liked_videos::<S>))
    // Playlists
    .route("/playlists/{id}", get(playlists::get_one::<S>))
    .route(
      "/playlists/{id}/videos/{video_id}",
      post(playlists::add_video::<S>).delete(playlists::remove_video::<S>),
    )
    // Dashboard
    .route("/dashboard/stats", get(dashboard::stats::<S>))
    .route("/dashboard/videos", get(dashboard::videos::<S>))
    .with_state(state)
}
