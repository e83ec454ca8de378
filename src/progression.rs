//! Adaptive progression: maps (position, stats of the answered level, correctness)
//! to the next position or to completion.
//!
//! Promotion needs at least `min_asked` answers at the current level; a wrong
//! answer demotes immediately. Only the just-answered (topic, level) counters are
//! consulted.

use serde::Deserialize;

use crate::domain::{Level, SessionPosition};
use crate::score::LevelStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
  Continue(SessionPosition),
  Completed,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct ProgressionPolicy {
  /// Answers required at a level before a correct one may promote.
  pub min_asked: u32,
}

impl Default for ProgressionPolicy {
  fn default() -> Self {
    Self { min_asked: 2 }
  }
}

impl ProgressionPolicy {
  /// `stats` are the counters of `position` *after* the current answer was recorded.
  pub fn next_step(&self, position: SessionPosition, stats: &LevelStats, is_correct: bool, topic_count: usize) -> Step {
    let SessionPosition { topic_index, level } = position;

    if !is_correct {
      return Step::Continue(SessionPosition::new(topic_index, level.demoted()));
    }

    if stats.asked < self.min_asked {
      return Step::Continue(position);
    }

    match level.promoted() {
      Some(next) => Step::Continue(SessionPosition::new(topic_index, next)),
      None if topic_index + 1 >= topic_count => Step::Completed,
      None => Step::Continue(SessionPosition::new(topic_index + 1, Level::Easy)),
    }
  }
}

/// `next_step` with the default two-answer gate.
pub fn next_step(position: SessionPosition, stats: &LevelStats, is_correct: bool, topic_count: usize) -> Step {
  ProgressionPolicy::default().next_step(position, stats, is_correct, topic_count)
}
