// ABOUTME: Anthropic Claude wire format for meal photo analysis
// ABOUTME: Builds Messages API requests with a base64 image block and extracts the text answer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Claude Provider
//!
//! Messages API (`POST /v1/messages`). The key travels in the `x-api-key`
//! header together with a pinned `anthropic-version`. The answer is the first
//! content block of type `text`.

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{authenticate, ProviderCall};
use platewise_core::AnalysisError;

/// API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// Build the Messages API request
pub(super) fn build_request(client: &Client, call: &ProviderCall<'_>) -> RequestBuilder {
    let body = ClaudeRequest {
        model: &call.endpoint.model,
        max_tokens: call.max_tokens,
        messages: vec![ClaudeMessage {
            role: "user",
            content: vec![
                ContentBlock::Image {
                    source: ImageSource {
                        source_type: "base64",
                        media_type: call.mime_type,
                        data: call.image_base64,
                    },
                },
                ContentBlock::Text { text: call.prompt },
            ],
        }],
    };

    authenticate(client.post(&call.endpoint.url), call.auth, call.api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&body)
}

/// Text of the first `text` content block
pub(super) fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let response: ClaudeResponse =
        serde_json::from_str(body).map_err(|_| AnalysisError::InvalidResponse)?;

    response
        .content
        .into_iter()
        .find(|block| block.block_type == "text")
        .and_then(|block| block.text)
        .ok_or(AnalysisError::InvalidResponse)
}
