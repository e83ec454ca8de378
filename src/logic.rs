//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Building the test structure (with the single-topic fallback)
//!   - Starting sessions and taking snapshots
//!   - Requesting questions with the caller-side retry policy
//!   - Submitting answers and producing the results report

use tracing::{error, info, instrument, warn};

use crate::domain::TestStructure;
use crate::error::QuizError;
use crate::protocol::{position_out, to_question_out, to_session_out, AnswerOut, QuestionOut, SessionOut};
use crate::provider::ContentProvider;
use crate::results::{summarize, SessionReport};
use crate::session::Session;
use crate::state::AppState;

/// Ask the provider for a structure; on failure fall back to `{subject, ["General"]}`.
/// The flag is true when the fallback is used.
#[instrument(level = "info", skip(provider), fields(provider = provider.name()))]
pub async fn build_structure(provider: &dyn ContentProvider, subject: &str) -> (TestStructure, bool) {
  match provider.generate_test_structure(subject).await {
    Ok(s) if !s.topics.is_empty() => (s, false),
    Ok(_) => {
      warn!(target: "quiz", %subject, "Provider returned no topics; degraded mode with single-topic structure");
      (TestStructure::single_topic(subject), true)
    }
    Err(e) => {
      warn!(target: "quiz", %subject, error = %e, "Structure generation failed; degraded mode with single-topic structure");
      (TestStructure::single_topic(subject), true)
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn start_session(state: &AppState, subject: &str, duration_minutes: Option<f64>) -> Result<SessionOut, QuizError> {
  let subject = subject.trim();
  if subject.is_empty() {
    return Err(QuizError::InvalidRequest("subject must not be empty".into()));
  }
  let duration = duration_minutes.or(state.settings.default_duration_minutes);
  if let Some(d) = duration {
    if !d.is_finite() || d <= 0.0 {
      return Err(QuizError::InvalidRequest(format!("durationMinutes must be positive, got {}", d)));
    }
  }

  let (structure, degraded) = build_structure(state.provider.as_ref(), subject).await;
  let session = Session::start_with_policy(structure.topics, duration, state.settings.policy())?;
  let out_topics = session.state().structure.topics.len();
  let id = state.insert_session(session).await;
  info!(target: "quiz", session_id = %id, %subject, topics = out_topics, ?duration, degraded, "Session started");

  let handle = state.get_session(&id).await?;
  let session = handle.lock().await;
  Ok(to_session_out(&id, &session, Some(degraded)))
}

/// Snapshot with an explicit time check, so an overdue session reports completed.
#[instrument(level = "debug", skip(state))]
pub async fn session_snapshot(state: &AppState, session_id: &str) -> Result<SessionOut, QuizError> {
  let handle = state.get_session(session_id).await?;
  let mut session = handle.lock().await;
  session.check_time();
  Ok(to_session_out(session_id, &session, None))
}

/// Request the next question, retrying provider failures up to `question_attempts` times.
#[instrument(level = "info", skip(state))]
pub async fn next_question(state: &AppState, session_id: &str) -> Result<QuestionOut, QuizError> {
  let handle = state.get_session(session_id).await?;
  let mut session = handle.lock().await;

  let attempts = state.settings.question_attempts.max(1);
  let mut last_err = None;
  for attempt in 1..=attempts {
    match session.request_question(state.provider.as_ref()).await {
      Ok(q) => {
        let number = session.state().questions_asked + 1;
        return Ok(to_question_out(&q, number));
      }
      Err(QuizError::ContentGeneration(msg)) => {
        warn!(target: "quiz", %session_id, attempt, attempts, error = %msg, "Question attempt failed");
        last_err = Some(QuizError::ContentGeneration(msg));
      }
      Err(other) => return Err(other),
    }
  }
  let err = last_err.unwrap_or_else(|| QuizError::ContentGeneration("no attempts made".into()));
  error!(target: "quiz", %session_id, attempts, error = %err, "Giving up on question generation");
  Err(err)
}

#[instrument(level = "info", skip(state))]
pub async fn submit_answer(state: &AppState, session_id: &str, question_id: &str, selected: usize) -> Result<AnswerOut, QuizError> {
  let handle = state.get_session(session_id).await?;
  let mut session = handle.lock().await;

  let explanation = session
    .pending_question()
    .filter(|q| q.id == question_id)
    .map(|q| q.explanation.clone())
    .unwrap_or_default();
  let record = session.submit_answer(question_id, selected)?;
  let st = session.state();
  info!(target: "quiz", %session_id, correct = record.is_correct, asked = st.questions_asked, completed = st.completed, "Answer recorded");

  Ok(AnswerOut {
    correct: record.is_correct,
    selected_option: record.selected_option_text,
    correct_option: record.correct_option_text,
    explanation,
    position: position_out(&session),
    completed: st.completed,
    completion_reason: st.completion_reason,
  })
}

#[instrument(level = "info", skip(state))]
pub async fn session_results(state: &AppState, session_id: &str) -> Result<SessionReport, QuizError> {
  let handle = state.get_session(session_id).await?;
  let mut session = handle.lock().await;
  session.check_time();
  Ok(summarize(session.state(), state.settings.weak_area_threshold))
}

#[instrument(level = "info", skip(state))]
pub async fn end_session(state: &AppState, session_id: &str) -> Result<(), QuizError> {
  state.remove_session(session_id).await?;
  info!(target: "quiz", %session_id, "Session removed");
  Ok(())
}
