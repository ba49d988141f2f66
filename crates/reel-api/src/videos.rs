//! Handlers for `/videos` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/videos` | `?query&sort_by&sort_type&user_id&page&limit` |
//! | `GET`  | `/videos/{id}` | 404 if not found |
//! | `GET`  | `/videos/{id}/comments` | `?page&limit`; 404 if the video is missing |

use axum::extract::{Path, Query, State};
use reel_core::{
  Id,
  page::{Page, PageRequest},
  pipeline::SortDirection,
  search::{self, SortKey, VideoQuery},
  store::DocumentStore,
  views::{self, CommentView, VideoDetail, VideoSummary},
};
use serde::Deserialize;

use crate::{ApiResponse, ApiState, CurrentActor, error::ApiResult};

// ─── Search ──────────────────────────────────────────────────────────────────

/// Raw query-string values. Everything is optional text so that malformed
/// paging input falls back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  pub query:     Option<String>,
  pub sort_by:   Option<String>,
  pub sort_type: Option<String>,
  pub user_id:   Option<String>,
  pub page:      Option<String>,
  pub limit:     Option<String>,
}

impl SearchParams {
  pub fn to_query(&self) -> reel_core::Result<VideoQuery> {
    let owner_id = match self.user_id.as_deref().map(str::trim) {
      Some(raw) if !raw.is_empty() => Some(Id::parse(raw)?),
      _ => None,
    };
    Ok(VideoQuery {
      text: self.query.clone(),
      owner_id,
      sort_key: self
        .sort_by
        .as_deref()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(SortKey::CreatedAt),
      direction: self
        .sort_type
        .as_deref()
        .and_then(SortDirection::parse)
        .unwrap_or_default(),
      published_only: true,
      page: PageRequest::parse(self.page.as_deref(), self.limit.as_deref()),
    })
  }
}

/// `GET /videos`
pub async fn search<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<SearchParams>,
) -> ApiResult<Page<VideoSummary>> {
  let query = params.to_query()?;
  let page = search::search_videos(&*state.store, &query).await?;
  Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

// ─── Detail ──────────────────────────────────────────────────────────────────

/// `GET /videos/{id}`
pub async fn detail<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<String>,
) -> ApiResult<VideoDetail> {
  let video = views::video_detail(&*state.store, &id, actor).await?;
  Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub page:  Option<String>,
  pub limit: Option<String>,
}

impl PageParams {
  pub fn to_request(&self) -> PageRequest {
    PageRequest::parse(self.page.as_deref(), self.limit.as_deref())
  }
}

/// `GET /videos/{id}/comments`
pub async fn comments<S: DocumentStore>(
  State(state): State<ApiState<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<String>,
  Query(params): Query<PageParams>,
) -> ApiResult<Page<CommentView>> {
  let page = views::video_comments(&*state.store, &id, actor, params.to_request()).await?;
  Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}
