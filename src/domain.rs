//! Domain models: levels, topics, test structure, questions and the answer log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty tier of a question. Ordered Easy < Medium < Hard.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Level {
  Easy,
  Medium,
  Hard,
}

impl Level {
  pub const ALL: [Level; 3] = [Level::Easy, Level::Medium, Level::Hard];

  /// Slot of this level inside fixed-size per-level tables.
  pub fn index(self) -> usize {
    match self {
      Level::Easy => 0,
      Level::Medium => 1,
      Level::Hard => 2,
    }
  }

  /// Next level up, `None` at Hard.
  pub fn promoted(self) -> Option<Level> {
    match self {
      Level::Easy => Some(Level::Medium),
      Level::Medium => Some(Level::Hard),
      Level::Hard => None,
    }
  }

  /// Next level down; Easy stays Easy.
  pub fn demoted(self) -> Level {
    match self {
      Level::Easy => Level::Easy,
      Level::Medium => Level::Easy,
      Level::Hard => Level::Medium,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Level::Easy => "easy",
      Level::Medium => "medium",
      Level::Hard => "hard",
    }
  }
}

impl Default for Level {
  fn default() -> Self { Level::Easy }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A named unit of subject content with its ordered subtopics.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
  pub name: String,
  #[serde(default)]
  pub subtopics: Vec<String>,
}

impl Topic {
  pub fn new(name: impl Into<String>, subtopics: &[&str]) -> Self {
    Self {
      name: name.into(),
      subtopics: subtopics.iter().map(|s| s.to_string()).collect(),
    }
  }
}

/// Ordered topics of one test. Order defines progression order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestStructure {
  pub topics: Vec<Topic>,
}

impl TestStructure {
  /// Degraded structure used when the provider cannot produce one.
  pub fn single_topic(subject: &str) -> Self {
    Self { topics: vec![Topic::new(subject, &["General"])] }
  }
}

/// A multiple-choice question as handed out by a content provider.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
  pub id: String,
  pub text: String,
  pub options: Vec<String>,
  pub correct_answer: usize,
  #[serde(default)]
  pub explanation: String,
  pub topic: String,
  pub level: Level,
}

impl Question {
  pub fn correct_option(&self) -> &str {
    self.options.get(self.correct_answer).map(String::as_str).unwrap_or_default()
  }
}

/// One submitted answer. Appended to the session log, never mutated.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AnswerRecord {
  pub question_text: String,
  pub selected_option_text: String,
  pub correct_option_text: String,
  pub is_correct: bool,
  pub topic: String,
  pub level: Level,
  pub timestamp: DateTime<Utc>,
}

/// The cursor driving progression.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SessionPosition {
  pub topic_index: usize,
  pub level: Level,
}

impl SessionPosition {
  pub fn new(topic_index: usize, level: Level) -> Self {
    Self { topic_index, level }
  }
}

/// Why a session stopped accepting answers.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
  /// Hard level of the last topic was cleared.
  TopicsExhausted,
  /// The fixed duration ran out.
  TimeExpired,
}
