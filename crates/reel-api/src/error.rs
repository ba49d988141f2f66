//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use reel_core::Error as CoreError;
use thiserror::Error;

use crate::envelope::ApiResponse;

/// An error returned by an API handler, rendered inside the response
/// envelope with `success: false`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    let ApiError::Core(e) = self;
    match e {
      CoreError::InvalidReference(_) | CoreError::Validation(_) | CoreError::SelfSubscription => {
        StatusCode::BAD_REQUEST
      }
      CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
      CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      CoreError::Conflict(_) => StatusCode::CONFLICT,
      CoreError::Persistence(_) | CoreError::Blob(_) | CoreError::Serialization(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    ApiResponse::failure(status, self.to_string()).into_response()
  }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
