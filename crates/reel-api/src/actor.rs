//! Current-actor extractor.
//!
//! Authentication happens upstream; by the time a request arrives here the
//! authenticated user id, if any, is in a configurable header.

use axum::{extract::FromRequestParts, http::request::Parts};
use reel_core::{Error as CoreError, Id, store::DocumentStore};

use crate::{ApiState, error::ApiError};

/// The resolved current actor, or `None` for anonymous requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentActor(pub Option<Id>);

impl<S> FromRequestParts<ApiState<S>> for CurrentActor
where
  S: DocumentStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(&state.actor_header) else {
      return Ok(CurrentActor(None));
    };
    // A header that is present but unusable is an authentication failure,
    // never a silent downgrade to anonymous.
    let id = value
      .to_str()
      .ok()
      .and_then(|raw| raw.trim().parse::<Id>().ok())
      .ok_or_else(|| CoreError::Unauthorized("malformed actor header".to_owned()))?;
    Ok(CurrentActor(Some(id)))
  }
}
