// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Mock provider HTTP backends on localhost, sample photos, and orchestrator setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `platewise`
//!
//! [`MockServer`] stands in for all three cloud APIs on one ephemeral port.
//! Each provider route replies with a configured status, body and delay, and
//! every request is recorded for assertions on authentication and payload.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use image::{ImageFormat, Rgb, RgbImage};
use platewise::config::AnalysisConfig;
use platewise::credentials::StaticCredentials;
use platewise::on_device::{NutritionTable, OnDeviceAdapter};
use platewise::Orchestrator;
use platewise_core::ProviderId;
use serde_json::json;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// What a mock route answers
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn ok(body: String) -> Self {
        Self {
            status: 200,
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: json!({"error": {"message": format!("mock status {status}")}}).to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request as the mock saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub provider: ProviderId,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: serde_json::Value,
}

/// Localhost stand-in for the three cloud APIs
pub struct MockServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn route(
    provider: ProviderId,
    reply: MockReply,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) -> axum::routing::MethodRouter {
    post(
        move |uri: axum::http::Uri,
              headers: HeaderMap,
              Query(query): Query<HashMap<String, String>>,
              body: String| {
            let reply = reply.clone();
            let requests = Arc::clone(&requests);
            async move {
                requests.lock().unwrap().push(RecordedRequest {
                    provider,
                    path: uri.path().to_owned(),
                    headers: headers
                        .iter()
                        .map(|(k, v)| (k.as_str().to_owned(), v.to_str().unwrap_or("").to_owned()))
                        .collect(),
                    query,
                    body: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
                });
                tokio::time::sleep(reply.delay).await;
                (
                    StatusCode::from_u16(reply.status).unwrap(),
                    [("content-type", "application/json")],
                    reply.body,
                )
            }
        },
    )
}

impl MockServer {
    /// Serve the given replies; providers without one answer 404
    pub async fn start(replies: Vec<(ProviderId, MockReply)>) -> Self {
        init_test_logging();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let mut app = Router::new();
        for (provider, reply) in replies {
            let path = match provider {
                ProviderId::Claude => "/claude/v1/messages",
                ProviderId::OpenAi => "/openai/v1/chat/completions",
                ProviderId::Gemini => "/gemini/models/:model_method",
                ProviderId::OnDevice => continue,
            };
            app = app.route(path, route(provider, reply, Arc::clone(&requests)));
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    /// Configuration pointing every cloud provider at this server
    pub fn config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig {
            model_path: None,
            ..AnalysisConfig::default()
        };
        config.claude.url = format!("http://{}/claude/v1/messages", self.addr);
        config.openai.url = format!("http://{}/openai/v1/chat/completions", self.addr);
        config.gemini.url = format!("http://{}/gemini/models", self.addr);
        config
    }

    /// Everything received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests received for one provider
    pub fn requests_for(&self, provider: ProviderId) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.provider == provider)
            .collect()
    }
}

/// Credentials for the given cloud providers
pub fn credentials(providers: &[ProviderId]) -> StaticCredentials {
    providers.iter().fold(StaticCredentials::new(), |creds, provider| {
        creds.with(*provider, format!("test-key-{}", provider.as_str()))
    })
}

/// Orchestrator against `config` with no on-device model
pub fn orchestrator(config: AnalysisConfig, credentials: StaticCredentials) -> Orchestrator {
    Orchestrator::new(
        config,
        Arc::new(credentials),
        OnDeviceAdapter::unavailable(NutritionTable::bundled().unwrap()),
    )
    .unwrap()
}

/// Solid-colour PNG
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Canonical answer text
pub fn answer(food: &str, calories: u32, rating: &str) -> String {
    json!({
        "foodName": food,
        "calorieEstimate": calories,
        "rating": rating,
        "reasoning": format!("Looks like {food}"),
    })
    .to_string()
}

/// Messages API response carrying `text`
pub fn claude_body(text: &str) -> String {
    json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-20250514",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
    })
    .to_string()
}

/// Chat completions response carrying `text`
pub fn openai_body(text: &str) -> String {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop",
        }],
    })
    .to_string()
}

/// `generateContent` response carrying `text`
pub fn gemini_body(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP",
        }],
    })
    .to_string()
}
