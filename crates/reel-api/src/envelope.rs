//! The uniform response envelope `{statusCode, data, message, success}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
  pub status_code: u16,
  pub data:        T,
  pub message:     String,
  pub success:     bool,
}

impl<T> ApiResponse<T> {
  pub fn ok(data: T, message: impl Into<String>) -> Self {
    Self {
      status_code: StatusCode::OK.as_u16(),
      data,
      message: message.into(),
      success: true,
    }
  }
}

impl ApiResponse<Value> {
  /// An error envelope. `data` is always `null`.
  pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
    Self {
      status_code: status.as_u16(),
      data:        Value::Null,
      message:     message.into(),
      success:     false,
    }
  }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
  fn into_response(self) -> Response {
    let status =
      StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(self)).into_response()
  }
}
