//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "quiz_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "quiz_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply = handle_text(&txt, &state).await;
        if let Err(e) = socket.send(Message::Text(reply)).await {
          error!(target: "quiz_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        if let Err(e) = socket.send(Message::Pong(payload)).await {
          error!(target: "quiz_backend", error = %e, "WS pong send error");
          break;
        }
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "quiz_backend", "WebSocket disconnected");
}

/// Parse, dispatch, serialize response.
pub async fn handle_text(txt: &str, state: &AppState) -> String {
  let reply_msg = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "quiz_backend", "WS received: {:?}", &incoming);
      handle_client_ws(incoming, state).await
    }
    Err(e) => ServerWsMessage::Error { error: "invalid_json".into(), message: format!("Invalid JSON: {}", e) },
  };

  serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "error": "serialization", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  let result = match msg {
    ClientWsMessage::Ping => return ServerWsMessage::Pong,

    ClientWsMessage::StartSession { subject, duration_minutes } => start_session(state, &subject, duration_minutes)
      .await
      .map(|session| {
        info!(target: "quiz", session_id = %session.session_id, "WS session created");
        ServerWsMessage::Session { session }
      }),

    ClientWsMessage::RequestQuestion { session_id } => next_question(state, &session_id)
      .await
      .map(|question| ServerWsMessage::Question { question }),

    ClientWsMessage::SubmitAnswer { session_id, question_id, selected } => {
      submit_answer(state, &session_id, &question_id, selected).await.map(|result| {
        info!(target: "quiz", %session_id, correct = result.correct, "WS submit_answer evaluated");
        ServerWsMessage::AnswerResult { result }
      })
    }

    ClientWsMessage::GetResults { session_id } => session_results(state, &session_id)
      .await
      .map(|report| ServerWsMessage::Results { report }),
  };

  result.unwrap_or_else(ServerWsMessage::from)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::QuizSettings;
  use crate::session::tests::ScriptedProvider;
  use serde_json::Value;

  #[tokio::test]
  async fn ws_messages_drive_a_session() {
    let state = AppState::with_provider(Arc::new(ScriptedProvider::new()), QuizSettings::default());

    let pong: Value = serde_json::from_str(&handle_text(r#"{"type": "ping"}"#, &state).await).unwrap();
    assert_eq!(pong["type"], "pong");

    let started: Value = serde_json::from_str(
      &handle_text(r#"{"type": "start_session", "subject": "Compiler Design"}"#, &state).await,
    ).unwrap();
    assert_eq!(started["type"], "session");
    let sid = started["session"]["session_id"].as_str().unwrap().to_string();

    let q: Value = serde_json::from_str(
      &handle_text(&format!(r#"{{"type": "request_question", "sessionId": "{}"}}"#, sid), &state).await,
    ).unwrap();
    assert_eq!(q["type"], "question");
    assert!(q["question"].get("correct_answer").is_none());
    let qid = q["question"]["id"].as_str().unwrap().to_string();

    let a: Value = serde_json::from_str(
      &handle_text(&format!(r#"{{"type": "submit_answer", "sessionId": "{}", "questionId": "{}", "selected": 1}}"#, sid, qid), &state).await,
    ).unwrap();
    assert_eq!(a["type"], "answer_result");
    assert_eq!(a["result"]["correct"], false);
    assert_eq!(a["result"]["position"]["level"], "easy");

    let r: Value = serde_json::from_str(
      &handle_text(&format!(r#"{{"type": "get_results", "sessionId": "{}"}}"#, sid), &state).await,
    ).unwrap();
    assert_eq!(r["type"], "results");
    assert_eq!(r["report"]["total_questions"], 1);
  }

  #[tokio::test]
  async fn ws_errors_are_typed() {
    let state = AppState::with_provider(Arc::new(ScriptedProvider::new()), QuizSettings::default());
    let bad: Value = serde_json::from_str(&handle_text("{not json", &state).await).unwrap();
    assert_eq!(bad["error"], "invalid_json");

    let unknown: Value = serde_json::from_str(
      &handle_text(r#"{"type": "get_results", "sessionId": "nope"}"#, &state).await,
    ).unwrap();
    assert_eq!(unknown["type"], "error");
    assert_eq!(unknown["error"], "unknown_session");
  }
}
