// ABOUTME: OpenAI chat completions wire format for meal photo analysis
// ABOUTME: Sends the image as a data URI content part and reads choices[0].message.content
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI` Provider
//!
//! Chat Completions (`POST /v1/chat/completions`) with bearer authentication.
//! The image is embedded as an `image_url` part holding a `data:` URI.

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{authenticate, ProviderCall};
use platewise_core::AnalysisError;

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<OpenAiMessage>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// `data:` URI for an inline image
fn data_uri(mime_type: &str, base64: &str) -> String {
    format!("data:{mime_type};base64,{base64}")
}

/// Build the chat completions request
pub(super) fn build_request(client: &Client, call: &ProviderCall<'_>) -> RequestBuilder {
    let body = OpenAiRequest {
        model: &call.endpoint.model,
        max_tokens: call.max_tokens,
        messages: vec![OpenAiMessage {
            role: "user",
            content: vec![
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: data_uri(call.mime_type, call.image_base64),
                    },
                },
                ContentPart::Text {
                    text: call.prompt.to_owned(),
                },
            ],
        }],
    };

    authenticate(client.post(&call.endpoint.url), call.auth, call.api_key).json(&body)
}

/// `choices[0].message.content`
pub(super) fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let response: OpenAiResponse =
        serde_json::from_str(body).map_err(|_| AnalysisError::InvalidResponse)?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(AnalysisError::InvalidResponse)
}
