//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{CompletionReason, Level, Question, Topic};
use crate::error::QuizError;
use crate::results::SessionReport;
use crate::session::Session;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartSession {
        subject: String,
        #[serde(default, rename = "durationMinutes")]
        duration_minutes: Option<f64>,
    },
    RequestQuestion {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    SubmitAnswer {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "questionId")]
        question_id: String,
        selected: usize,
    },
    GetResults {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session { session: SessionOut },
    Question { question: QuestionOut },
    AnswerResult { result: AnswerOut },
    Results { report: SessionReport },
    Error { error: String, message: String },
}

impl From<QuizError> for ServerWsMessage {
    fn from(e: QuizError) -> Self {
        ServerWsMessage::Error { error: e.code().to_string(), message: e.to_string() }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PositionOut {
    pub topic_index: usize,
    pub topic: String,
    pub level: Level,
}

/// Snapshot of a session's progress.
#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub session_id: String,
    pub topics: Vec<Topic>,
    pub position: PositionOut,
    pub questions_asked: u32,
    pub correct: u32,
    pub wrong: u32,
    pub accuracy: f64,
    pub time_remaining_minutes: Option<f64>,
    pub completed: bool,
    pub completion_reason: Option<CompletionReason>,
    /// Set on creation only: true when the single-topic fallback structure is in use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,
}

pub fn position_out(session: &Session) -> PositionOut {
    let st = session.state();
    PositionOut {
        topic_index: st.position.topic_index,
        topic: st.current_topic().name.clone(),
        level: st.position.level,
    }
}

pub fn to_session_out(session_id: &str, session: &Session, degraded: Option<bool>) -> SessionOut {
    let st = session.state();
    SessionOut {
        session_id: session_id.to_string(),
        topics: st.structure.topics.clone(),
        position: position_out(session),
        questions_asked: st.questions_asked,
        correct: st.correct_count,
        wrong: st.wrong_count,
        accuracy: crate::score::round1(crate::results::overall_accuracy(st)),
        time_remaining_minutes: session.time_remaining(),
        completed: st.completed,
        completion_reason: st.completion_reason,
        degraded,
    }
}

/// Question as shown to the learner: the answer index stays on the server.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: String,
    pub number: u32,
    pub text: String,
    pub options: Vec<String>,
    pub topic: String,
    pub level: Level,
}

pub fn to_question_out(q: &Question, number: u32) -> QuestionOut {
    QuestionOut {
        id: q.id.clone(),
        number,
        text: q.text.clone(),
        options: q.options.clone(),
        topic: q.topic.clone(),
        level: q.level,
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerOut {
    pub correct: bool,
    pub selected_option: String,
    pub correct_option: String,
    pub explanation: String,
    pub position: PositionOut,
    pub completed: bool,
    pub completion_reason: Option<CompletionReason>,
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartSessionIn {
    pub subject: String,
    #[serde(default, rename = "durationMinutes")]
    pub duration_minutes: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "questionId")]
    pub question_id: String,
    pub selected: usize,
}

#[derive(Serialize)]
pub struct SubjectsOut {
    pub semester: BTreeMap<u8, Vec<&'static str>>,
    pub interview: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
    pub message: String,
}
