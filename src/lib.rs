//! Adaptive quiz engine: per-topic difficulty progression, score tracking and
//! results reporting, served over HTTP and WebSocket.

pub mod telemetry;
pub mod util;
pub mod domain;
pub mod error;
pub mod config;
pub mod catalog;
pub mod score;
pub mod progression;
pub mod session;
pub mod results;
pub mod provider;
pub mod openai;
pub mod bank;
pub mod state;
pub mod protocol;
pub mod logic;
pub mod routes;
