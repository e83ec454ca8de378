//! Content provider seam and the decode step for provider documents.
//!
//! Providers answer with a JSON document, possibly wrapped in a fenced code block.
//! Decoding strips the wrapping, parses with serde and validates shape; every
//! failure becomes a `QuizError`, never a panic and never a made-up substitute.

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Level, Question, TestStructure, Topic};
use crate::error::QuizError;

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    async fn generate_test_structure(&self, subject: &str) -> Result<TestStructure, QuizError>;

    async fn generate_question(&self, topic: &str, subtopics: &[String], level: Level) -> Result<Question, QuizError>;
}

/// Remove surrounding whitespace and a Markdown code fence (with optional
/// language tag). An opening fence with no closing fence keeps the remainder.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        // Language tag line such as ```json
        Some(nl) if !rest[..nl].trim().contains(char::is_whitespace) && !rest[..nl].trim_start().starts_with('{') => {
            &rest[nl + 1..]
        }
        _ => rest.strip_prefix("json").unwrap_or(rest),
    };
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}

#[derive(Deserialize)]
struct StructureDoc {
    topics: Vec<TopicDoc>,
}

#[derive(Deserialize)]
struct TopicDoc {
    name: String,
    #[serde(default)]
    subtopics: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDoc {
    question: String,
    options: Vec<String>,
    correct_answer: i64,
    #[serde(default)]
    explanation: String,
}

/// Decode a `{"topics": [{"name", "subtopics"}]}` document.
pub fn decode_structure(raw: &str) -> Result<TestStructure, QuizError> {
    let body = strip_code_fences(raw);
    let doc: StructureDoc = serde_json::from_str(body)
        .map_err(|e| QuizError::StructureGeneration(format!("JSON parse error: {}", e)))?;

    if doc.topics.is_empty() {
        return Err(QuizError::StructureGeneration("structure has no topics".into()));
    }
    let mut topics = Vec::with_capacity(doc.topics.len());
    for t in doc.topics {
        let name = t.name.trim().to_string();
        if name.is_empty() {
            return Err(QuizError::StructureGeneration("topic with empty name".into()));
        }
        let subtopics = t
            .subtopics
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        topics.push(Topic { name, subtopics });
    }
    Ok(TestStructure { topics })
}

/// Decode a `{"question", "options", "correctAnswer", "explanation"}` document
/// and stamp it with the topic and level it was requested for.
pub fn decode_question(raw: &str, topic: &str, level: Level) -> Result<Question, QuizError> {
    let body = strip_code_fences(raw);
    let doc: QuestionDoc = serde_json::from_str(body)
        .map_err(|e| QuizError::ContentGeneration(format!("JSON parse error: {}", e)))?;

    if doc.question.trim().is_empty() {
        return Err(QuizError::ContentGeneration("question text is empty".into()));
    }
    if doc.options.len() < 2 {
        return Err(QuizError::ContentGeneration(format!(
            "expected at least 2 options, got {}",
            doc.options.len()
        )));
    }
    let correct_answer = usize::try_from(doc.correct_answer)
        .ok()
        .filter(|i| *i < doc.options.len())
        .ok_or_else(|| {
            QuizError::ContentGeneration(format!(
                "correctAnswer {} out of range for {} options",
                doc.correct_answer,
                doc.options.len()
            ))
        })?;

    Ok(Question {
        id: Uuid::new_v4().to_string(),
        text: doc.question.trim().to_string(),
        options: doc.options,
        correct_answer,
        explanation: doc.explanation,
        topic: topic.to_string(),
        level,
    })
}
