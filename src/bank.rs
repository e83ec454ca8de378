//! Local content provider backed by the `[bank]` section of the TOML config.
//!
//! Serves configured subject structures and hand-written questions, cycling
//! through each (topic, level) pool in order. Missing content is reported as an
//! error; nothing is invented.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{BankConfig, BankQuestion};
use crate::domain::{Level, Question, TestStructure};
use crate::error::QuizError;
use crate::provider::ContentProvider;

pub struct BankProvider {
    subjects: HashMap<String, TestStructure>,
    questions: HashMap<(String, Level), Vec<BankQuestion>>,
    cursors: Mutex<HashMap<(String, Level), usize>>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl BankProvider {
    /// Index the bank, dropping entries that could never be served.
    pub fn new(cfg: &BankConfig) -> Self {
        let mut subjects = HashMap::new();
        for s in &cfg.subjects {
            if s.topics.is_empty() {
                error!(target: "quiz", subject = %s.name, "Skipping bank subject: no topics.");
                continue;
            }
            subjects.insert(key(&s.name), TestStructure { topics: s.topics.clone() });
        }

        let mut questions: HashMap<(String, Level), Vec<BankQuestion>> = HashMap::new();
        for q in &cfg.questions {
            if q.options.len() < 2 || q.correct_answer >= q.options.len() || q.question.trim().is_empty() {
                error!(target: "quiz", topic = %q.topic, level = %q.level, question = %q.question, "Skipping bank question: invalid options or answer index.");
                continue;
            }
            questions.entry((key(&q.topic), q.level)).or_default().push(q.clone());
        }

        for ((topic, level), pool) in &questions {
            info!(target: "quiz", %topic, %level, count = pool.len(), "Bank question inventory");
        }

        Self { subjects, questions, cursors: Mutex::new(HashMap::new()) }
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty() && self.questions.is_empty()
    }

    /// Next index in the pool for `k`, wrapping around.
    fn pick(&self, k: &(String, Level), pool_len: usize) -> usize {
        let mut cursors = self.cursors.lock().unwrap_or_else(|p| p.into_inner());
        let cursor = cursors.entry(k.clone()).or_insert(0);
        let chosen = *cursor % pool_len;
        *cursor = (chosen + 1) % pool_len;
        chosen
    }
}

#[async_trait]
impl ContentProvider for BankProvider {
    fn name(&self) -> &'static str {
        "bank"
    }

    #[instrument(level = "debug", skip(self))]
    async fn generate_test_structure(&self, subject: &str) -> Result<TestStructure, QuizError> {
        self.subjects.get(&key(subject)).cloned().ok_or_else(|| {
            warn!(target: "quiz", %subject, "No bank structure for subject");
            QuizError::StructureGeneration(format!("no bank structure for subject '{}'", subject))
        })
    }

    #[instrument(level = "debug", skip_all, fields(%topic, %level))]
    async fn generate_question(&self, topic: &str, _subtopics: &[String], level: Level) -> Result<Question, QuizError> {
        let k = (key(topic), level);
        let pool = self.questions.get(&k).filter(|p| !p.is_empty()).ok_or_else(|| {
            QuizError::ContentGeneration(format!("no bank question for '{}' at {}", topic, level))
        })?;
        let q = &pool[self.pick(&k, pool.len())];

        Ok(Question {
            id: Uuid::new_v4().to_string(),
            text: q.question.clone(),
            options: q.options.clone(),
            correct_answer: q.correct_answer,
            explanation: q.explanation.clone(),
            topic: topic.to_string(),
            level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const BANK: &str = r#"
[[bank.subjects]]
name = "Data Structures"
topics = [{ name = "Stacks", subtopics = ["push", "pop"] }]

[[bank.subjects]]
name = "Empty"
topics = []

[[bank.questions]]
topic = "Stacks"
level = "easy"
question = "Which end does push use?"
options = ["Top", "Bottom"]
correctAnswer = 0

[[bank.questions]]
topic = "stacks"
level = "easy"
question = "Pop on empty stack?"
options = ["Underflow", "Overflow"]
correctAnswer = 0

[[bank.questions]]
topic = "Stacks"
level = "hard"
question = "Broken"
options = ["Only one"]
correctAnswer = 0
"#;

    fn bank() -> BankProvider {
        BankProvider::new(&parse_config(BANK).unwrap().bank)
    }

    #[tokio::test]
    async fn serves_structure_case_insensitively() {
        let b = bank();
        let s = b.generate_test_structure("data structures").await.unwrap();
        assert_eq!(s.topics[0].name, "Stacks");
        assert!(matches!(
            b.generate_test_structure("Empty").await,
            Err(QuizError::StructureGeneration(_))
        ));
    }

    #[tokio::test]
    async fn alternates_between_questions_of_a_level() {
        let b = bank();
        let mut last = String::new();
        for _ in 0..6 {
            let q = b.generate_question("Stacks", &[], Level::Easy).await.unwrap();
            assert_ne!(q.text, last);
            assert_eq!(q.level, Level::Easy);
            last = q.text;
        }
    }

    #[tokio::test]
    async fn cycles_through_the_whole_pool() {
        let doc: String = ["Top?", "Bottom?", "Middle?"]
            .iter()
            .map(|q| format!(
                "[[bank.questions]]\ntopic = \"T\"\nlevel = \"easy\"\nquestion = \"{}\"\noptions = [\"a\", \"b\"]\ncorrectAnswer = 0\n\n",
                q
            ))
            .collect();
        let b = BankProvider::new(&parse_config(&doc).unwrap().bank);

        let mut served = Vec::new();
        for _ in 0..3 {
            served.push(b.generate_question("T", &[], Level::Easy).await.unwrap().text);
        }
        assert_eq!(served, vec!["Top?", "Bottom?", "Middle?"]);

        let again = b.generate_question("T", &[], Level::Easy).await.unwrap();
        assert_eq!(again.text, "Top?");
    }

    #[tokio::test]
    async fn invalid_or_missing_questions_are_errors() {
        let b = bank();
        assert!(matches!(
            b.generate_question("Stacks", &[], Level::Hard).await,
            Err(QuizError::ContentGeneration(_))
        ));
        assert!(matches!(
            b.generate_question("Queues", &[], Level::Easy).await,
            Err(QuizError::ContentGeneration(_))
        ));
    }
}
