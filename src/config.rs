//! Loading quiz configuration (prompts, quiz policy, optional question bank) from TOML.
//!
//! See `QuizConfig`, `Prompts`, `QuizSettings` and `BankConfig` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Level, Topic};
use crate::progression::ProgressionPolicy;
use crate::results::DEFAULT_WEAK_AREA_THRESHOLD;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub quiz: QuizSettings,
  #[serde(default)]
  pub bank: BankConfig,
}

/// Prompts sent to the model. Placeholders: `{subject}`, `{topic}`, `{subtopics}`, `{level}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub structure_system: String,
  pub structure_user_template: String,
  pub question_system: String,
  pub question_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      structure_system: "You design assessment syllabi for university computer science courses. Respond ONLY with strict JSON.".into(),
      structure_user_template: "For the subject \"{subject}\", create a comprehensive test structure.\nReturn ONLY a JSON object with this structure:\n{\"topics\": [{\"name\": \"Topic Name\", \"subtopics\": [\"subtopic1\", \"subtopic2\", \"subtopic3\"]}]}\nInclude 5-8 major topics with 3-5 subtopics each. No markdown, no explanation.".into(),
      question_system: "You write multiple-choice exam questions. Respond ONLY with strict JSON.".into(),
      question_user_template: "Generate 1 multiple-choice question for \"{topic}\" covering subtopics: {subtopics} at {level} difficulty.\nReturn ONLY a JSON object:\n{\"question\": \"Question text?\", \"options\": [\"A\", \"B\", \"C\", \"D\"], \"correctAnswer\": 0, \"explanation\": \"Brief explanation\"}\nNo markdown, no explanation.".into(),
    }
  }
}

/// Session policy knobs.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
  /// Accuracy (percent) below which an attempted (topic, level) is a weak area.
  pub weak_area_threshold: f64,
  /// Provider attempts per question request before the error is surfaced.
  pub question_attempts: u32,
  /// Answers required at a level before a correct answer promotes.
  pub min_questions_per_level: u32,
  /// Used when a start request carries no duration. Absent = unbounded.
  pub default_duration_minutes: Option<f64>,
}

impl Default for QuizSettings {
  fn default() -> Self {
    Self {
      weak_area_threshold: DEFAULT_WEAK_AREA_THRESHOLD,
      question_attempts: 3,
      min_questions_per_level: ProgressionPolicy::default().min_asked,
      default_duration_minutes: None,
    }
  }
}

impl QuizSettings {
  pub fn policy(&self) -> ProgressionPolicy {
    ProgressionPolicy { min_asked: self.min_questions_per_level.max(1) }
  }
}

/// Local content: subject structures and hand-written questions.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct BankConfig {
  #[serde(default)]
  pub subjects: Vec<BankSubject>,
  #[serde(default)]
  pub questions: Vec<BankQuestion>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BankSubject {
  pub name: String,
  pub topics: Vec<Topic>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BankQuestion {
  pub topic: String,
  pub level: Level,
  pub question: String,
  pub options: Vec<String>,
  #[serde(rename = "correctAnswer", alias = "correct_answer")]
  pub correct_answer: usize,
  #[serde(default)]
  pub explanation: String,
}

/// Parse a TOML document into `QuizConfig`.
pub fn parse_config(s: &str) -> Result<QuizConfig, toml::de::Error> {
  toml::from_str::<QuizConfig>(s)
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "quiz_backend", %path, subjects = cfg.bank.subjects.len(), questions = cfg.bank.questions.len(), "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quiz_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quiz_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
