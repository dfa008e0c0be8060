//! Request-level error taxonomy and its HTTP mapping.
//!
//! Every fallible operation in the core returns `Result<_, ApiError>`; the
//! router converts the error into a status code plus a small JSON body of the
//! shape `{"error": "..."}`. Nothing here should ever panic a handler.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  /// Malformed or mismatched input (bad answer count, empty title, unknown
  /// learning mode, missing identity header).
  #[error("{0}")]
  Validation(String),

  /// A referenced user/course/quiz/attempt id did not resolve.
  #[error("{0} not found")]
  NotFound(&'static str),

  /// Duplicate insert on a unique key (document id, user+course preference).
  #[error("{0}")]
  Conflict(String),

  /// The ML collaborator was unreachable or returned a malformed payload.
  #[error("upstream service error: {0}")]
  Upstream(String),
}

impl ApiError {
  pub fn validation(msg: impl Into<String>) -> Self {
    ApiError::Validation(msg.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = Json(json!({ "error": self.to_string() }));
    (status, body).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn statuses_follow_the_taxonomy() {
    assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::NotFound("Quiz").status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
    assert_eq!(ApiError::Upstream("down".into()).status(), StatusCode::SERVICE_UNAVAILABLE);
  }

  #[test]
  fn not_found_message_names_the_resource() {
    assert_eq!(ApiError::NotFound("Course").to_string(), "Course not found");
  }
}
