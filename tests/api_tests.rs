//! End-to-end tests over the HTTP router with a deterministic content provider.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
  body::Body,
  http::{Method, Request, StatusCode},
  Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use adaptive_quiz_backend::config::QuizSettings;
use adaptive_quiz_backend::domain::{Level, Question, TestStructure, Topic};
use adaptive_quiz_backend::error::QuizError;
use adaptive_quiz_backend::provider::ContentProvider;
use adaptive_quiz_backend::routes::build_router;
use adaptive_quiz_backend::state::AppState;

/// Two topics; option 0 is always right. "Broken" subjects fail structure generation,
/// and questions on topic "Empty" always fail.
struct FixedProvider;

#[async_trait]
impl ContentProvider for FixedProvider {
  fn name(&self) -> &'static str { "fixed" }

  async fn generate_test_structure(&self, subject: &str) -> Result<TestStructure, QuizError> {
    if subject == "Broken" {
      return Err(QuizError::StructureGeneration("not json".into()));
    }
    Ok(TestStructure { topics: vec![Topic::new("Algebra", &["equations"]), Topic::new("Geometry", &["angles"])] })
  }

  async fn generate_question(&self, topic: &str, _subtopics: &[String], level: Level) -> Result<Question, QuizError> {
    if topic == "Empty" {
      return Err(QuizError::ContentGeneration("no content".into()));
    }
    Ok(Question {
      id: uuid::Uuid::new_v4().to_string(),
      text: format!("{} at {}?", topic, level),
      options: vec!["yes".into(), "no".into()],
      correct_answer: 0,
      explanation: "it is".into(),
      topic: topic.to_string(),
      level,
    })
  }
}

fn app() -> Router {
  let state = AppState::with_provider(Arc::new(FixedProvider), QuizSettings::default());
  build_router(Arc::new(state))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(b) => builder.header("content-type", "application/json").body(Body::from(b.to_string())).unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = res.into_body().collect().await.unwrap().to_bytes();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

async fn start(app: &Router, subject: &str) -> String {
  let (status, body) = call(app, Method::POST, "/api/v1/sessions", Some(json!({ "subject": subject }))).await;
  assert_eq!(status, StatusCode::CREATED);
  body["session_id"].as_str().unwrap().to_string()
}

async fn answer(app: &Router, sid: &str, correct: bool) -> Value {
  let (status, q) = call(app, Method::POST, &format!("/api/v1/sessions/{}/question", sid), None).await;
  assert_eq!(status, StatusCode::OK);
  let body = json!({ "questionId": q["id"], "selected": if correct { 0 } else { 1 } });
  let (status, a) = call(app, Method::POST, &format!("/api/v1/sessions/{}/answer", sid), Some(body)).await;
  assert_eq!(status, StatusCode::OK);
  a
}

#[tokio::test]
async fn health_and_subjects() {
  let app = app();
  let (status, body) = call(&app, Method::GET, "/api/v1/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["ok"], true);

  let (status, body) = call(&app, Method::GET, "/api/v1/subjects", None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["semester"]["3"].as_array().unwrap().len() > 1);
  assert!(!body["interview"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn full_session_moves_through_levels_and_topics() {
  let app = app();
  let sid = start(&app, "Mathematics").await;

  // Easy gate, then a wrong answer at medium drops back to easy.
  assert_eq!(answer(&app, &sid, true).await["position"]["level"], "easy");
  assert_eq!(answer(&app, &sid, true).await["position"]["level"], "medium");
  let wrong = answer(&app, &sid, false).await;
  assert_eq!(wrong["correct"], false);
  assert_eq!(wrong["selected_option"], "no");
  assert_eq!(wrong["correct_option"], "yes");
  assert_eq!(wrong["position"]["level"], "easy");

  // Easy gate already met: one correct promotes, then medium needs its own gate.
  assert_eq!(answer(&app, &sid, true).await["position"]["level"], "medium");
  assert_eq!(answer(&app, &sid, true).await["position"]["level"], "hard");
  answer(&app, &sid, true).await;
  let next = answer(&app, &sid, true).await;
  assert_eq!(next["position"]["topic"], "Geometry");
  assert_eq!(next["position"]["level"], "easy");

  let (_, snap) = call(&app, Method::GET, &format!("/api/v1/sessions/{}", sid), None).await;
  assert_eq!(snap["questions_asked"], 7);
  assert_eq!(snap["correct"], 6);
  assert_eq!(snap["wrong"], 1);
  assert_eq!(snap["completed"], false);

  let (status, report) = call(&app, Method::GET, &format!("/api/v1/sessions/{}/results", sid), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["total_questions"], 7);
  let weak = report["weak_areas"].as_array().unwrap();
  assert_eq!(weak.len(), 1);
  assert_eq!(weak[0]["topic"], "Algebra");
  assert_eq!(weak[0]["level"], "medium");
  assert!(report["recommendation"].as_str().unwrap().contains("Algebra (medium)"));

  let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/sessions/{}", sid), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&app, Method::GET, &format!("/api/v1/sessions/{}", sid), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clearing_the_last_topic_completes_the_session() {
  let app = app();
  let sid = start(&app, "Mathematics").await;
  let mut last = Value::Null;
  for _ in 0..12 {
    last = answer(&app, &sid, true).await;
  }
  assert_eq!(last["completed"], true);
  assert_eq!(last["completion_reason"], "topics_exhausted");

  let (status, body) = call(&app, Method::POST, &format!("/api/v1/sessions/{}/question", sid), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "invariant_violation");

  let (status, report) = call(&app, Method::GET, &format!("/api/v1/sessions/{}/results", sid), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["completed"], true);
  assert_eq!(report["completion_reason"], "topics_exhausted");
}

#[tokio::test]
async fn failed_structure_generation_degrades_to_one_topic() {
  let app = app();
  let (status, body) = call(&app, Method::POST, "/api/v1/sessions", Some(json!({ "subject": "Broken" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["degraded"], true);
  assert_eq!(body["topics"][0]["name"], "Broken");
  assert_eq!(body["topics"][0]["subtopics"][0], "General");
}

#[tokio::test]
async fn error_statuses() {
  let app = app();
  let (status, body) = call(&app, Method::GET, "/api/v1/sessions/nope/results", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "unknown_session");

  let (status, body) = call(&app, Method::POST, "/api/v1/sessions", Some(json!({ "subject": "" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid_request");

  let (status, _) = call(&app, Method::POST, "/api/v1/sessions", Some(json!({ "subject": "Maths", "durationMinutes": 0 }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  // Answering with no pending question is a protocol violation.
  let sid = start(&app, "Mathematics").await;
  let (status, body) = call(
    &app,
    Method::POST,
    &format!("/api/v1/sessions/{}/answer", sid),
    Some(json!({ "questionId": "made-up", "selected": 0 })),
  ).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "invariant_violation");
}

#[tokio::test]
async fn content_failure_maps_to_bad_gateway() {
  let app = app();
  let (status, body) = call(&app, Method::POST, "/api/v1/sessions", Some(json!({ "subject": "Broken" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  let sid = body["session_id"].as_str().unwrap().to_string();

  // The fallback topic is named after the subject; questions still generate.
  let (status, _) = call(&app, Method::POST, &format!("/api/v1/sessions/{}/question", sid), None).await;
  assert_eq!(status, StatusCode::OK);

  let empty = AppState::with_provider(Arc::new(FixedProvider), QuizSettings::default());
  let session = adaptive_quiz_backend::session::Session::start(vec![Topic::new("Empty", &[])], None).unwrap();
  let sid = empty.insert_session(session).await;
  let app = build_router(Arc::new(empty));
  let (status, body) = call(&app, Method::POST, &format!("/api/v1/sessions/{}/question", sid), None).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(body["error"], "content_generation");
}
