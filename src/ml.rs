//! Minimal client for the external ML microservice (recommendations,
//! question generation, tutor chat).
//!
//! The service is an opaque collaborator: we forward ids and content, it
//! returns ranked course ids / question drafts / tutor text. Calls are
//! instrumented and log latencies and response sizes, never payload contents.
//! Transport failures get exactly one local retry; HTTP-level errors do not.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::ApiError;

#[derive(Clone)]
pub struct MlService {
  pub client: reqwest::Client,
  pub base_url: String,
}

/// Question-generation response; the drafts themselves stay opaque JSON.
#[derive(Debug, Deserialize)]
pub struct GeneratedQuestions {
  pub questions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TutorResponse {
  response: String,
}

#[derive(Serialize)]
struct TutorRequest<'a> {
  message: &'a str,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  course_content: &'a str,
}

impl MlService {
  /// Construct the client if we find ML_SERVICE_URL; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("ML_SERVICE_URL").ok()?;
    let timeout = std::env::var("ML_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .unwrap_or(20);

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout))
      .build()
      .ok()?;

    Some(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
  }

  /// GET with one retry on transport errors (connect/timeout), none on
  /// HTTP-level failures.
  #[instrument(level = "info", skip(self, query), fields(%path))]
  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, ApiError> {
    let url = format!("{}{}", self.base_url, path);
    let start = std::time::Instant::now();

    let mut res = self
      .client
      .get(&url)
      .header(USER_AGENT, "elearn-backend/0.1")
      .query(query)
      .send()
      .await;
    if let Err(e) = &res {
      if e.is_timeout() || e.is_connect() {
        warn!(target: "ml", %path, error = %e, "ML transport error; retrying once");
        res = self
          .client
          .get(&url)
          .header(USER_AGENT, "elearn-backend/0.1")
          .query(query)
          .send()
          .await;
      }
    }
    let res = res.map_err(|e| ApiError::Upstream(e.to_string()))?;
    Self::decode(res, start).await
  }

  #[instrument(level = "info", skip(self, body), fields(%path))]
  async fn post_json<T: DeserializeOwned>(
    &self,
    path: &str,
    body: &impl Serialize,
  ) -> Result<T, ApiError> {
    let url = format!("{}{}", self.base_url, path);
    let start = std::time::Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "elearn-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(body)
      .send()
      .await
      .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Self::decode(res, start).await
  }

  async fn decode<T: DeserializeOwned>(
    res: reqwest::Response,
    start: std::time::Instant,
  ) -> Result<T, ApiError> {
    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let msg = extract_ml_error(&body).unwrap_or(body);
      return Err(ApiError::Upstream(format!("ML HTTP {status}: {msg}")));
    }
    let body = res.text().await.map_err(|e| ApiError::Upstream(e.to_string()))?;
    info!(target: "ml", elapsed = ?start.elapsed(), bytes = body.len(), "ML response received");
    serde_json::from_str::<T>(&body)
      .map_err(|e| ApiError::Upstream(format!("malformed ML payload: {e}")))
  }

  // --- High-level helpers (one per collaborator endpoint) ---

  /// Ranked courses for a user from the collaborative model. Passed through
  /// verbatim; the payload shape belongs to the ML service.
  pub async fn recommend_collaborative(&self, user_id: &str) -> Result<Value, ApiError> {
    self
      .get_json("/recommend/collaborative", &[("user_id", user_id.to_string())])
      .await
  }

  /// Courses similar to one course from the content-based model.
  pub async fn recommend_content(&self, course_id: &str) -> Result<Value, ApiError> {
    self
      .get_json("/recommend/content", &[("course_id", course_id.to_string())])
      .await
  }

  /// Blend of both models.
  pub async fn recommend_hybrid(
    &self,
    user_id: &str,
    course_id: &str,
    top_n: usize,
  ) -> Result<Value, ApiError> {
    self
      .get_json(
        "/recommend/hybrid",
        &[
          ("user_id", user_id.to_string()),
          ("course_id", course_id.to_string()),
          ("top_n", top_n.to_string()),
        ],
      )
      .await
  }

  /// Question drafts generated from raw course content.
  #[instrument(level = "info", skip(self, course_content), fields(content_len = course_content.len()))]
  pub async fn generate_questions(&self, course_content: &str) -> Result<GeneratedQuestions, ApiError> {
    self
      .post_json("/api/question-generator/generate", &GenerateRequest { course_content })
      .await
  }

  /// One tutor reply for an already-templated prompt.
  #[instrument(level = "info", skip(self, prompt), fields(prompt_len = prompt.len()))]
  pub async fn tutor_reply(&self, prompt: &str) -> Result<String, ApiError> {
    let out: TutorResponse = self.post_json("/chat", &TutorRequest { message: prompt }).await?;
    Ok(out.response.trim().to_string())
  }
}

/// Try to extract a clean error message from an ML error body.
fn extract_ml_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: String,
  }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_bodies_are_unwrapped_when_possible() {
    assert_eq!(
      extract_ml_error(r#"{"error":"User not found or no recommendations available"}"#),
      Some("User not found or no recommendations available".into())
    );
    assert_eq!(extract_ml_error("<html>502</html>"), None);
  }
}
