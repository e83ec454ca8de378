//! Error kinds surfaced by the quiz core and the content providers.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuizError {
    /// Provider returned unparsable or structurally invalid question content.
    #[error("content generation failed: {0}")]
    ContentGeneration(String),

    /// Provider could not produce a usable test structure.
    #[error("test structure generation failed: {0}")]
    StructureGeneration(String),

    /// Caller broke the request/answer protocol.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl QuizError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        QuizError::InvariantViolation(msg.into())
    }

    /// Short machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            QuizError::ContentGeneration(_) => "content_generation",
            QuizError::StructureGeneration(_) => "structure_generation",
            QuizError::InvariantViolation(_) => "invariant_violation",
            QuizError::UnknownSession(_) => "unknown_session",
            QuizError::InvalidRequest(_) => "invalid_request",
        }
    }
}
