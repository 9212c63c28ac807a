// ABOUTME: Google Gemini wire format for meal photo analysis
// ABOUTME: Sends inline_data image parts via generateContent and reads the first candidate's text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Gemini Provider
//!
//! `POST {base}/{model}:generateContent?key=<api key>`.
//!
//! Gemini reports an invalid key as HTTP 400 (`API_KEY_INVALID`) rather than
//! 401, so its status mapping treats 400 as a credential failure. Quota
//! errors (429) carry a "Please retry in Ns" hint that is surfaced in logs.

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{authenticate, default_status_error, ProviderCall};
use platewise_core::AnalysisError;

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Gemini API request structure
#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

/// Content structure for Gemini API
#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<ContentPart<'a>>,
}

/// Part of content (inline image or text)
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart<'a> {
    /// Base64 image payload
    InlineData { inline_data: InlineData<'a> },
    /// Text content
    Text { text: &'a str },
}

/// Inline binary payload
#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

/// Generation configuration
#[derive(Debug, Serialize)]
struct GenerationConfig {
    max_output_tokens: u32,
}

/// Gemini API response structure
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
}

/// Response candidate
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

// ============================================================================
// Wire functions
// ============================================================================

/// Build the API URL for a model and method
fn build_url(base: &str, model: &str) -> String {
    format!("{}/{model}:generateContent", base.trim_end_matches('/'))
}

/// Build the `generateContent` request
pub(super) fn build_request(client: &Client, call: &ProviderCall<'_>) -> RequestBuilder {
    let body = GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![
                ContentPart::InlineData {
                    inline_data: InlineData {
                        mime_type: call.mime_type,
                        data: call.image_base64,
                    },
                },
                ContentPart::Text { text: call.prompt },
            ],
        }],
        generation_config: GenerationConfig {
            max_output_tokens: call.max_tokens,
        },
    };

    authenticate(
        client.post(build_url(&call.endpoint.url, &call.endpoint.model)),
        call.auth,
        call.api_key,
    )
    .json(&body)
}

/// `candidates[0].content.parts[0].text`, skipping thought summaries
pub(super) fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|_| AnalysisError::InvalidResponse)?;

    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| {
            content
                .parts
                .into_iter()
                .find(|part| !part.thought && part.text.is_some())
        })
        .and_then(|part| part.text)
        .ok_or(AnalysisError::InvalidResponse)
}

/// Gemini answers an invalid key with 400
pub(super) fn status_error(status: u16) -> Option<AnalysisError> {
    match status {
        400 => Some(AnalysisError::InvalidCredential),
        other => default_status_error(other),
    }
}

/// Seconds from a "Please retry in 6.406453963s." quota message
pub(super) fn retry_hint_secs(message: &str) -> Option<u64> {
    let after_prefix = &message[message.find("Please retry in ")? + 16..];
    let seconds = after_prefix[..after_prefix.find('s')?].parse::<f64>().ok()?;
    Some(seconds.ceil() as u64)
}
