//! Read-only analytics over a finished (or running) session.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{CompletionReason, Level};
use crate::score::{accuracy, round1};
use crate::session::SessionState;

pub const DEFAULT_WEAK_AREA_THRESHOLD: f64 = 60.0;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BreakdownEntry {
  pub topic: String,
  pub level: Level,
  pub asked: u32,
  pub correct: u32,
  pub accuracy: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct WeakArea {
  pub topic: String,
  pub level: Level,
}

/// Correct over asked across the whole log, in percent.
pub fn overall_accuracy(state: &SessionState) -> f64 {
  if state.questions_asked == 0 {
    0.0
  } else {
    100.0 * f64::from(state.correct_count) / f64::from(state.questions_asked)
  }
}

/// Attempted (topic, level) pairs in topic order, then Easy, Medium, Hard.
pub fn per_topic_breakdown(state: &SessionState) -> Vec<BreakdownEntry> {
  state
    .scores
    .iter()
    .flat_map(|t| {
      t.levels.iter().filter(|(_, s)| s.asked > 0).map(move |(level, s)| BreakdownEntry {
        topic: t.topic.clone(),
        level,
        asked: s.asked,
        correct: s.correct,
        accuracy: accuracy(s),
      })
    })
    .collect()
}

/// Attempted pairs whose accuracy is strictly below `threshold`.
pub fn weak_areas(state: &SessionState, threshold: f64) -> Vec<WeakArea> {
  per_topic_breakdown(state)
    .into_iter()
    .filter(|e| e.accuracy < threshold)
    .map(|e| WeakArea { topic: e.topic, level: e.level })
    .collect()
}

pub fn elapsed_minutes(state: &SessionState) -> f64 {
  state.elapsed_minutes_at(Utc::now())
}

/// Everything the results page shows, ready to serialize.
#[derive(Clone, Debug, Serialize)]
pub struct SessionReport {
  pub total_questions: u32,
  pub correct: u32,
  pub wrong: u32,
  pub accuracy: f64,
  pub elapsed_minutes: f64,
  pub duration_minutes: Option<f64>,
  pub completed: bool,
  pub completion_reason: Option<CompletionReason>,
  pub breakdown: Vec<BreakdownEntry>,
  pub weak_areas: Vec<WeakArea>,
  pub recommendation: String,
}

pub fn summarize(state: &SessionState, threshold: f64) -> SessionReport {
  summarize_at(state, threshold, Utc::now())
}

pub fn summarize_at(state: &SessionState, threshold: f64, now: DateTime<Utc>) -> SessionReport {
  let breakdown: Vec<BreakdownEntry> = per_topic_breakdown(state)
    .into_iter()
    .map(|e| BreakdownEntry { accuracy: round1(e.accuracy), ..e })
    .collect();
  let weak = weak_areas(state, threshold);
  let recommendation = if weak.is_empty() {
    "Great performance across all topics!".to_string()
  } else {
    let list: Vec<String> = weak.iter().map(|w| format!("{} ({})", w.topic, w.level)).collect();
    format!("Focus on these areas: {}", list.join(", "))
  };

  SessionReport {
    total_questions: state.questions_asked,
    correct: state.correct_count,
    wrong: state.wrong_count,
    accuracy: round1(overall_accuracy(state)),
    elapsed_minutes: state.elapsed_minutes_at(now),
    duration_minutes: state.duration_minutes,
    completed: state.completed,
    completion_reason: state.completion_reason,
    breakdown,
    weak_areas: weak,
    recommendation,
  }
}
