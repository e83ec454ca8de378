//! Minimal OpenAI-compatible client acting as the content provider.
//!
//! We only call chat.completions and ask for plain text, then run the shared
//! decode step (fence stripping + JSON validation) on the reply.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::Prompts;
use crate::domain::{Level, Question, TestStructure};
use crate::error::QuizError;
use crate::provider::{decode_question, decode_structure, ContentProvider};
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub prompts: Prompts,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model =
      std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    Self::new(api_key, base_url, model, prompts)
  }

  pub fn new(api_key: String, base_url: String, model: String, prompts: Prompts) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), model, prompts })
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat_plain(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      max_tokens: None,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "adaptive-quiz-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();
    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Model response received");

    if text.is_empty() {
      return Err("empty completion".into());
    }
    Ok(text)
  }
}

#[async_trait]
impl ContentProvider for OpenAI {
  fn name(&self) -> &'static str { "openai" }

  #[instrument(level = "info", skip(self))]
  async fn generate_test_structure(&self, subject: &str) -> Result<TestStructure, QuizError> {
    let system = fill_template(&self.prompts.structure_system, &[("subject", subject)]);
    let user = fill_template(&self.prompts.structure_user_template, &[("subject", subject)]);

    let text = self.chat_plain(&system, &user, 0.7).await.map_err(|e| {
      error!(target: "quiz", %subject, error = %e, "Model call failed during structure generation");
      QuizError::StructureGeneration(e)
    })?;
    debug!(target: "quiz", raw = %trunc_for_log(&text, 200), "Structure document");

    let structure = decode_structure(&text)?;
    info!(target: "quiz", %subject, topics = structure.topics.len(), "Test structure generated");
    Ok(structure)
  }

  #[instrument(level = "info", skip_all, fields(%topic, %level, subtopics = subtopics.len()))]
  async fn generate_question(&self, topic: &str, subtopics: &[String], level: Level) -> Result<Question, QuizError> {
    let subtopics_str = subtopics.join(", ");
    let level_str = level.as_str();
    let pairs = [("topic", topic), ("subtopics", subtopics_str.as_str()), ("level", level_str)];
    let system = fill_template(&self.prompts.question_system, &pairs);
    let user = fill_template(&self.prompts.question_user_template, &pairs);

    let text = self.chat_plain(&system, &user, 0.9).await.map_err(|e| {
      error!(target: "quiz", %topic, %level, error = %e, "Model call failed during question generation");
      QuizError::ContentGeneration(e)
    })?;
    debug!(target: "quiz", raw = %trunc_for_log(&text, 200), "Question document");

    decode_question(&text, topic, level)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{http::StatusCode, routing::post, Json, Router};
  use serde_json::{json, Value};
  use tokio::net::TcpListener;

  /// Serve `reply` as the assistant message (or an error status) on a local port.
  async fn fake_openai(status: StatusCode, reply: &'static str) -> String {
    let app = Router::new().route(
      "/v1/chat/completions",
      post(move |Json(_req): Json<Value>| async move {
        if status.is_success() {
          (status, Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": reply } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
          })))
        } else {
          (status, Json(json!({ "error": { "message": reply } })))
        }
      }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
  }

  fn client(base_url: String) -> OpenAI {
    OpenAI::new("test-key".into(), base_url, "test-model".into(), Prompts::default()).unwrap()
  }

  #[test]
  fn extracts_error_message() {
    assert_eq!(
      extract_openai_error(r#"{"error": {"message": "bad key", "type": "auth"}}"#),
      Some("bad key".to_string())
    );
    assert_eq!(extract_openai_error("<html>"), None);
  }

  #[tokio::test]
  async fn question_reply_is_unfenced_and_decoded() {
    let url = fake_openai(
      StatusCode::OK,
      "```json\n{\"question\": \"Size of int?\", \"options\": [\"2\", \"4\"], \"correctAnswer\": 1, \"explanation\": \"Typically 4 bytes.\"}\n```",
    ).await;
    let q = client(url).generate_question("Types", &["int".into()], Level::Medium).await.unwrap();
    assert_eq!(q.text, "Size of int?");
    assert_eq!(q.correct_option(), "4");
    assert_eq!(q.level, Level::Medium);
    assert_eq!(q.topic, "Types");
  }

  #[tokio::test]
  async fn malformed_question_is_a_content_error() {
    let url = fake_openai(StatusCode::OK, "Sure! Here is your question: what is a pointer?").await;
    let err = client(url).generate_question("Pointers", &[], Level::Easy).await.unwrap_err();
    assert!(matches!(err, QuizError::ContentGeneration(_)));
  }

  #[tokio::test]
  async fn http_failure_maps_to_structure_error() {
    let url = fake_openai(StatusCode::UNAUTHORIZED, "Incorrect API key provided").await;
    let err = client(url).generate_test_structure("Operating Systems").await.unwrap_err();
    match err {
      QuizError::StructureGeneration(msg) => assert!(msg.contains("Incorrect API key provided")),
      other => panic!("unexpected error {:?}", other),
    }
  }

  #[tokio::test]
  async fn structure_reply_is_decoded() {
    let url = fake_openai(
      StatusCode::OK,
      "{\"topics\": [{\"name\": \"Processes\", \"subtopics\": [\"scheduling\"]}, {\"name\": \"Memory\", \"subtopics\": [\"paging\"]}]}",
    ).await;
    let s = client(url).generate_test_structure("Operating Systems").await.unwrap();
    assert_eq!(s.topics.len(), 2);
    assert_eq!(s.topics[1].name, "Memory");
  }
}
