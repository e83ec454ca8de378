//! Per-topic, per-level answer counters.
//!
//! The table keeps topics in structure order and holds exactly one `LevelStats`
//! slot per `Level`, so lookups by level are exhaustive at compile time.

use serde::Serialize;

use crate::domain::{Level, Topic};
use crate::error::QuizError;

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct LevelStats {
  pub asked: u32,
  pub correct: u32,
}

impl LevelStats {
  /// Accuracy in percent with full precision. 0 when nothing was asked.
  pub fn accuracy(&self) -> f64 {
    accuracy(self)
  }
}

/// Counters for the three levels of one topic.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct LevelScores([LevelStats; 3]);

impl LevelScores {
  pub fn get(&self, level: Level) -> &LevelStats {
    &self.0[level.index()]
  }

  fn get_mut(&mut self, level: Level) -> &mut LevelStats {
    &mut self.0[level.index()]
  }

  /// (level, stats) pairs in Easy, Medium, Hard order.
  pub fn iter(&self) -> impl Iterator<Item = (Level, &LevelStats)> {
    Level::ALL.into_iter().map(move |l| (l, self.get(l)))
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct TopicScores {
  pub topic: String,
  pub levels: LevelScores,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ScoreTable {
  topics: Vec<TopicScores>,
}

impl ScoreTable {
  pub fn topic(&self, name: &str) -> Option<&LevelScores> {
    self.topics.iter().find(|t| t.topic == name).map(|t| &t.levels)
  }

  pub fn stats(&self, name: &str, level: Level) -> Option<&LevelStats> {
    self.topic(name).map(|l| l.get(level))
  }

  /// Topics in structure order.
  pub fn iter(&self) -> impl Iterator<Item = &TopicScores> {
    self.topics.iter()
  }

  pub fn len(&self) -> usize {
    self.topics.len()
  }

  pub fn is_empty(&self) -> bool {
    self.topics.is_empty()
  }
}

/// Zeroed counters for every topic x level.
///
/// A topic name repeated in the structure shares a single entry.
pub fn initialize(topics: &[Topic]) -> ScoreTable {
  let mut table = ScoreTable::default();
  for t in topics {
    if table.topic(&t.name).is_none() {
      table.topics.push(TopicScores { topic: t.name.clone(), levels: LevelScores::default() });
    }
  }
  table
}

/// Count one answer. Call exactly once per submitted answer.
pub fn record(table: &mut ScoreTable, topic: &str, level: Level, is_correct: bool) -> Result<(), QuizError> {
  let entry = table
    .topics
    .iter_mut()
    .find(|t| t.topic == topic)
    .ok_or_else(|| QuizError::invariant(format!("topic '{}' is not part of the score table", topic)))?;
  let stats = entry.levels.get_mut(level);
  stats.asked += 1;
  if is_correct {
    stats.correct += 1;
  }
  Ok(())
}

pub fn accuracy(stats: &LevelStats) -> f64 {
  if stats.asked == 0 {
    0.0
  } else {
    100.0 * f64::from(stats.correct) / f64::from(stats.asked)
  }
}

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
  (value * 10.0).round() / 10.0
}
