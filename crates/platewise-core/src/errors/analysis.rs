// ABOUTME: Per-attempt failure taxonomy shared by every analysis provider
// ABOUTME: Maps transport, HTTP status, parsing, and on-device failures to one closed set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single provider attempt failed.
///
/// Causes are carried as strings so outcomes stay `Clone` and can be shown,
/// logged and serialized after the underlying transport error is gone.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AnalysisError {
    /// Provider rejected the credential (HTTP 401/403)
    #[error("invalid credential")]
    InvalidCredential,
    /// Provider rate limited the request (HTTP 429)
    #[error("rate limited")]
    RateLimited,
    /// Provider returned a 5xx status
    #[error("server error: {0}")]
    ServerError(u16),
    /// Unexpected status or a response envelope without an answer
    #[error("invalid response")]
    InvalidResponse,
    /// The model's answer did not decode into the canonical schema
    #[error("decoding error: {0}")]
    DecodingError(String),
    /// The on-device model asset is missing or could not be loaded
    #[error("on-device model unavailable")]
    ModelUnavailable,
    /// No classification candidate passed the confidence threshold
    #[error("classification failed")]
    ClassificationFailed,
    /// The request never produced an HTTP response
    #[error("network error: {0}")]
    NetworkError(String),
    /// The image could not be decoded or re-encoded before dispatch
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// The attempt's task aborted before producing a result
    #[error("attempt aborted: {0}")]
    TaskFailed(String),
}

impl AnalysisError {
    /// User-facing description, used when every provider failed and the
    /// individual failures are shown together.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::InvalidCredential => "Invalid API key. Please check your settings.".to_owned(),
            Self::NetworkError(cause) => format!("Network error: {cause}"),
            Self::InvalidResponse => "Invalid response from server".to_owned(),
            Self::DecodingError(_) => "Failed to parse response".to_owned(),
            Self::RateLimited => "Rate limited. Please try again later.".to_owned(),
            Self::ServerError(code) => format!("Server error: {code}"),
            Self::ModelUnavailable => {
                "On-device model not available. Install a food classifier model asset.".to_owned()
            }
            Self::ClassificationFailed => "Failed to classify the image.".to_owned(),
            Self::InvalidImage(reason) => format!("Could not process the image: {reason}"),
            Self::TaskFailed(reason) => format!("Analysis aborted: {reason}"),
        }
    }

    /// Stable short name of the kind, for structured logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "invalid_credential",
            Self::RateLimited => "rate_limited",
            Self::ServerError(_) => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::DecodingError(_) => "decoding_error",
            Self::ModelUnavailable => "model_unavailable",
            Self::ClassificationFailed => "classification_failed",
            Self::NetworkError(_) => "network_error",
            Self::InvalidImage(_) => "invalid_image",
            Self::TaskFailed(_) => "task_failed",
        }
    }
}
