//! One adaptive test session: owned state, the pending question, time policy.
//!
//! Every operation is an explicit request/response step. A session is driven by
//! one caller at a time; the service layer wraps each `Session` in its own mutex.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::{AnswerRecord, CompletionReason, Question, SessionPosition, TestStructure, Topic};
use crate::error::QuizError;
use crate::progression::{ProgressionPolicy, Step};
use crate::provider::ContentProvider;
use crate::score::{self, ScoreTable};

/// Everything the results view needs. Frozen once `completed` is set.
#[derive(Clone, Debug, Serialize)]
pub struct SessionState {
  pub structure: TestStructure,
  pub scores: ScoreTable,
  pub position: SessionPosition,
  pub answers: Vec<AnswerRecord>,
  pub questions_asked: u32,
  pub correct_count: u32,
  pub wrong_count: u32,
  pub started_at: DateTime<Utc>,
  pub duration_minutes: Option<f64>,
  pub completed: bool,
  pub completion_reason: Option<CompletionReason>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl SessionState {
  pub fn current_topic(&self) -> &Topic {
    &self.structure.topics[self.position.topic_index]
  }

  pub fn elapsed_minutes_at(&self, now: DateTime<Utc>) -> f64 {
    let end = self.completed_at.unwrap_or(now);
    (end - self.started_at).num_milliseconds() as f64 / 60_000.0
  }

  /// `None` when unbounded; negative once overdue.
  pub fn time_remaining_at(&self, now: DateTime<Utc>) -> Option<f64> {
    self.duration_minutes.map(|d| d - self.elapsed_minutes_at(now))
  }

  pub fn is_time_expired_at(&self, now: DateTime<Utc>) -> bool {
    matches!(self.time_remaining_at(now), Some(r) if r <= 0.0)
  }

  fn complete(&mut self, reason: CompletionReason, now: DateTime<Utc>) {
    if self.completed {
      return;
    }
    self.completed = true;
    self.completion_reason = Some(reason);
    self.completed_at = Some(now);
  }
}

pub struct Session {
  state: SessionState,
  pending: Option<Question>,
  policy: ProgressionPolicy,
}

impl Session {
  /// Begin a test at (topic 0, Easy) with zeroed counters.
  pub fn start(topics: Vec<Topic>, duration_minutes: Option<f64>) -> Result<Self, QuizError> {
    Self::start_with_policy(topics, duration_minutes, ProgressionPolicy::default())
  }

  pub fn start_with_policy(
    topics: Vec<Topic>,
    duration_minutes: Option<f64>,
    policy: ProgressionPolicy,
  ) -> Result<Self, QuizError> {
    if topics.is_empty() {
      return Err(QuizError::invariant("a session needs at least one topic"));
    }
    if let Some(d) = duration_minutes {
      if !d.is_finite() || d <= 0.0 {
        return Err(QuizError::invariant(format!("duration must be a positive number of minutes, got {}", d)));
      }
    }

    let scores = score::initialize(&topics);
    let state = SessionState {
      structure: TestStructure { topics },
      scores,
      position: SessionPosition::default(),
      answers: Vec::new(),
      questions_asked: 0,
      correct_count: 0,
      wrong_count: 0,
      started_at: Utc::now(),
      duration_minutes,
      completed: false,
      completion_reason: None,
      completed_at: None,
    };
    Ok(Self { state, pending: None, policy })
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  pub fn current_position(&self) -> SessionPosition {
    self.state.position
  }

  pub fn pending_question(&self) -> Option<&Question> {
    self.pending.as_ref()
  }

  pub fn is_completed(&self) -> bool {
    self.state.completed
  }

  pub fn time_remaining(&self) -> Option<f64> {
    self.state.time_remaining_at(Utc::now())
  }

  pub fn is_time_expired(&self) -> bool {
    self.state.is_time_expired_at(Utc::now())
  }

  /// Explicit time check: freezes the session once the duration has run out.
  pub fn check_time(&mut self) -> Option<f64> {
    self.check_time_at(Utc::now())
  }

  fn check_time_at(&mut self, now: DateTime<Utc>) -> Option<f64> {
    let remaining = self.state.time_remaining_at(now);
    if !self.state.completed && self.state.is_time_expired_at(now) {
      info!(target: "quiz", asked = self.state.questions_asked, "Time expired; session completed");
      self.state.complete(CompletionReason::TimeExpired, now);
      self.pending = None;
    }
    remaining
  }

  /// Ask the provider for a question at the current position.
  ///
  /// A still-pending question is handed back unchanged. Provider failures leave
  /// the session untouched.
  #[instrument(level = "info", skip(self, provider), fields(provider = provider.name()))]
  pub async fn request_question(&mut self, provider: &dyn ContentProvider) -> Result<Question, QuizError> {
    self.check_time();
    if self.state.completed {
      return Err(QuizError::invariant("session is already completed"));
    }
    if let Some(q) = &self.pending {
      debug!(target: "quiz", question_id = %q.id, "Question already pending; returning it again");
      return Ok(q.clone());
    }

    let level = self.state.position.level;
    let topic = self.state.current_topic().clone();
    let mut question = provider.generate_question(&topic.name, &topic.subtopics, level).await.map_err(|e| {
      warn!(target: "quiz", topic = %topic.name, %level, error = %e, "Question generation failed");
      match e {
        QuizError::ContentGeneration(_) => e,
        other => QuizError::ContentGeneration(other.to_string()),
      }
    })?;
    question.topic = topic.name;
    question.level = level;

    info!(target: "quiz", question_id = %question.id, topic = %question.topic, %level, "Question ready");
    self.pending = Some(question.clone());
    Ok(question)
  }

  /// Grade the pending question, update counters and log, then move the cursor.
  ///
  /// Topic exhaustion and time expiry are checked independently after every answer.
  #[instrument(level = "info", skip(self))]
  pub fn submit_answer(&mut self, question_id: &str, selected: usize) -> Result<AnswerRecord, QuizError> {
    self.submit_answer_at(question_id, selected, Utc::now())
  }

  fn submit_answer_at(&mut self, question_id: &str, selected: usize, now: DateTime<Utc>) -> Result<AnswerRecord, QuizError> {
    if self.state.completed {
      return Err(QuizError::invariant("session is already completed"));
    }
    let question = match &self.pending {
      Some(q) if q.id == question_id => q,
      Some(q) => {
        return Err(QuizError::invariant(format!(
          "answer for question {} but question {} is pending",
          question_id, q.id
        )))
      }
      None => return Err(QuizError::invariant("no question is pending")),
    };
    let Some(selected_text) = question.options.get(selected) else {
      return Err(QuizError::invariant(format!(
        "selected option {} out of range for {} options",
        selected,
        question.options.len()
      )));
    };

    let is_correct = selected == question.correct_answer;
    let record = AnswerRecord {
      question_text: question.text.clone(),
      selected_option_text: selected_text.clone(),
      correct_option_text: question.correct_option().to_string(),
      is_correct,
      topic: question.topic.clone(),
      level: question.level,
      timestamp: now,
    };

    score::record(&mut self.state.scores, &record.topic, record.level, is_correct)?;
    self.pending = None;

    let state = &mut self.state;
    state.questions_asked += 1;
    if is_correct {
      state.correct_count += 1;
    } else {
      state.wrong_count += 1;
    }
    state.answers.push(record.clone());

    let stats = state
      .scores
      .stats(&record.topic, record.level)
      .copied()
      .unwrap_or_default();
    match self.policy.next_step(state.position, &stats, is_correct, state.structure.topics.len()) {
      Step::Continue(next) => {
        if next != state.position {
          debug!(target: "quiz", from_topic = state.position.topic_index, from_level = %state.position.level,
            to_topic = next.topic_index, to_level = %next.level, "Position changed");
        }
        state.position = next;
      }
      Step::Completed => {
        info!(target: "quiz", asked = state.questions_asked, correct = state.correct_count, "All topics cleared; session completed");
        state.complete(CompletionReason::TopicsExhausted, now);
      }
    }

    self.check_time_at(now);
    Ok(record)
  }
}
