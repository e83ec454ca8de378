//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::catalog::{interview_subjects, semester_subjects};
use crate::error::QuizError;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

/// `QuizError` rendered as a JSON body with a matching status code.
pub struct ApiError(pub QuizError);

impl From<QuizError> for ApiError {
  fn from(e: QuizError) -> Self { ApiError(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self.0 {
      QuizError::UnknownSession(_) => StatusCode::NOT_FOUND,
      QuizError::ContentGeneration(_) | QuizError::StructureGeneration(_) => StatusCode::BAD_GATEWAY,
      QuizError::InvariantViolation(_) => StatusCode::CONFLICT,
      QuizError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    };
    warn!(target: "quiz_backend", %status, error = %self.0, "Request failed");
    let body = ErrorOut { error: self.0.code().to_string(), message: self.0.to_string() };
    (status, Json(body)).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_get_subjects() -> impl IntoResponse {
  Json(SubjectsOut { semester: semester_subjects(), interview: interview_subjects() })
}

#[instrument(level = "info", skip(state, body), fields(subject = %body.subject, duration = ?body.duration_minutes))]
pub async fn http_post_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartSessionIn>,
) -> Result<impl IntoResponse, ApiError> {
  let out = start_session(&state, &body.subject, body.duration_minutes).await?;
  info!(target: "quiz", session_id = %out.session_id, topics = out.topics.len(), "HTTP session created");
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  Ok(Json(session_snapshot(&state, &id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_question(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  let q = next_question(&state, &id).await?;
  info!(target: "quiz", session_id = %id, question_id = %q.id, level = %q.level, "HTTP question served");
  Ok(Json(q))
}

#[instrument(level = "info", skip(state, body), fields(question_id = %body.question_id, selected = body.selected))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIn>,
) -> Result<impl IntoResponse, ApiError> {
  let out = submit_answer(&state, &id, &body.question_id, body.selected).await?;
  info!(target: "quiz", session_id = %id, correct = out.correct, completed = out.completed, "HTTP answer evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_results(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  Ok(Json(session_results(&state, &id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  end_session(&state, &id).await?;
  Ok(StatusCode::NO_CONTENT)
}
