// ABOUTME: Cloud provider adapters sharing one request/response pipeline
// ABOUTME: Each provider contributes a request builder, text extractor, and status mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Cloud Meal Analysis Providers
//!
//! Every cloud adapter runs the same pipeline:
//!
//! 1. Downscale and re-encode the photo ([`crate::imaging`]).
//! 2. Build the provider-specific JSON request and POST it once.
//! 3. Map the HTTP status: 200 proceeds, 401/403 is `InvalidCredential`,
//!    429 is `RateLimited`, 5xx is `ServerError(code)`, anything else is
//!    `InvalidResponse`.
//! 4. Pull the model's text answer out of the provider envelope.
//! 5. Strip code fences and decode against the canonical schema.
//!
//! Only steps 2-4 differ between providers, so each provider is reduced to a
//! [`Wire`] of plain functions selected by [`CloudProvider::wire`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use platewise::config::AnalysisConfig;
//! use platewise::llm::{CloudAdapter, CloudProvider};
//!
//! # async fn example(photo: Vec<u8>) {
//! let config = AnalysisConfig::default();
//! let adapter = CloudAdapter::new(
//!     CloudProvider::Gemini,
//!     &config,
//!     "api-key".to_owned(),
//!     reqwest::Client::new(),
//! );
//! let result = adapter.analyze(Arc::from(photo)).await;
//! # }
//! ```

mod claude;
mod gemini;
mod openai;
pub mod parsing;
pub mod prompts;

pub use parsing::{parse_canonical, strip_code_fences};
pub use prompts::default_analysis_prompt;

use std::error::Error as _;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{AnalysisConfig, CloudEndpoint};
use crate::imaging::{self, ImageOptions};
use platewise_core::{AnalysisError, AuthStyle, CanonicalResult, ProviderId};

/// Everything a request builder needs for one call
pub struct ProviderCall<'a> {
    /// Endpoint URL and model
    pub endpoint: &'a CloudEndpoint,
    /// Credential
    pub api_key: &'a str,
    /// Analysis instruction
    pub prompt: &'a str,
    /// Base64 image payload
    pub image_base64: &'a str,
    /// MIME type of the payload
    pub mime_type: &'a str,
    /// Output token cap
    pub max_tokens: u32,
    /// How the credential is presented
    pub auth: AuthStyle,
}

/// Provider-specific steps of the shared pipeline
#[derive(Clone, Copy)]
pub struct Wire {
    /// Build the HTTP request
    pub build_request: fn(&Client, &ProviderCall<'_>) -> RequestBuilder,
    /// Extract the answer text from a 200 response body
    pub extract_text: fn(&str) -> Result<String, AnalysisError>,
    /// Map a status code to a failure, `None` meaning "parse the body"
    pub status_error: fn(u16) -> Option<AnalysisError>,
}

/// Status mapping shared by all cloud providers
#[must_use]
pub const fn default_status_error(status: u16) -> Option<AnalysisError> {
    match status {
        200 => None,
        401 | 403 => Some(AnalysisError::InvalidCredential),
        429 => Some(AnalysisError::RateLimited),
        500..=599 => Some(AnalysisError::ServerError(status)),
        _ => Some(AnalysisError::InvalidResponse),
    }
}

/// The network-backed providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudProvider {
    /// Anthropic Claude
    Claude,
    /// `OpenAI`
    OpenAi,
    /// Google Gemini
    Gemini,
}

impl CloudProvider {
    /// All cloud providers
    pub const ALL: [Self; 3] = [Self::Claude, Self::OpenAi, Self::Gemini];

    /// Corresponding provider identity
    #[must_use]
    pub const fn id(self) -> ProviderId {
        match self {
            Self::Claude => ProviderId::Claude,
            Self::OpenAi => ProviderId::OpenAi,
            Self::Gemini => ProviderId::Gemini,
        }
    }

    /// Cloud provider for an identity, `None` for the on-device provider
    #[must_use]
    pub const fn from_id(id: ProviderId) -> Option<Self> {
        match id {
            ProviderId::Claude => Some(Self::Claude),
            ProviderId::OpenAi => Some(Self::OpenAi),
            ProviderId::Gemini => Some(Self::Gemini),
            ProviderId::OnDevice => None,
        }
    }

    /// Request builder, text extractor and status mapping for this provider
    #[must_use]
    pub fn wire(self) -> Wire {
        match self {
            Self::Claude => Wire {
                build_request: claude::build_request,
                extract_text: claude::extract_text,
                status_error: default_status_error,
            },
            Self::OpenAi => Wire {
                build_request: openai::build_request,
                extract_text: openai::extract_text,
                status_error: default_status_error,
            },
            Self::Gemini => Wire {
                build_request: gemini::build_request,
                extract_text: gemini::extract_text,
                status_error: gemini::status_error,
            },
        }
    }
}

/// Attach `api_key` the way the provider's descriptor says
#[must_use]
pub fn authenticate(request: RequestBuilder, auth: AuthStyle, api_key: &str) -> RequestBuilder {
    match auth {
        AuthStyle::Header(name) => request.header(name, api_key),
        AuthStyle::Bearer => request.bearer_auth(api_key),
        AuthStyle::QueryKey(name) => request.query(&[(name, api_key)]),
        AuthStyle::None => request,
    }
}

/// `{"error": {"message": ...}}`, the error envelope all three providers share
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Best-effort human message from an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |envelope| envelope.error.message,
    )
}

/// Transport failure, with the URL removed so query-string keys never leak
fn network_error(error: reqwest::Error) -> AnalysisError {
    let error = error.without_url();
    if error.is_timeout() {
        return AnalysisError::NetworkError("request timed out".to_owned());
    }
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    AnalysisError::NetworkError(message)
}

/// One cloud provider bound to a credential
pub struct CloudAdapter {
    provider: CloudProvider,
    endpoint: CloudEndpoint,
    api_key: String,
    prompt: Arc<str>,
    image_options: ImageOptions,
    max_tokens: u32,
    client: Client,
}

impl CloudAdapter {
    /// Bind `provider` to `api_key` using the endpoint and prompt from `config`
    #[must_use]
    pub fn new(
        provider: CloudProvider,
        config: &AnalysisConfig,
        api_key: String,
        client: Client,
    ) -> Self {
        Self {
            provider,
            endpoint: config.endpoint(provider).clone(),
            api_key,
            prompt: Arc::clone(&config.prompt),
            image_options: config.image,
            max_tokens: config.max_tokens,
            client,
        }
    }

    /// Provider identity
    #[must_use]
    pub const fn provider(&self) -> ProviderId {
        self.provider.id()
    }

    /// Analyze one photo.
    ///
    /// # Errors
    ///
    /// Returns the [`AnalysisError`] kind matching whichever pipeline step
    /// failed; see the module documentation.
    #[instrument(skip_all, fields(provider = self.provider.id().as_str(), model = %self.endpoint.model))]
    pub async fn analyze(&self, image: Arc<[u8]>) -> Result<CanonicalResult, AnalysisError> {
        let prepared = imaging::prepare_for_upload(image, self.image_options).await?;
        let image_base64 = prepared.to_base64();
        let call = ProviderCall {
            endpoint: &self.endpoint,
            api_key: &self.api_key,
            prompt: &self.prompt,
            image_base64: &image_base64,
            mime_type: prepared.mime_type(),
            max_tokens: self.max_tokens,
            auth: self.provider.id().descriptor().auth,
        };
        let wire = self.provider.wire();

        debug!(payload_bytes = image_base64.len(), "Sending analysis request");

        let response = (wire.build_request)(&self.client, &call)
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status().as_u16();

        if let Some(error) = (wire.status_error)(status) {
            // The status decides the outcome; the body only feeds the log
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            warn!(status, kind = error.kind(), message = %message, "Provider returned an error status");
            if self.provider == CloudProvider::Gemini && status == 429 {
                if let Some(secs) = gemini::retry_hint_secs(&message) {
                    info!(retry_after_secs = secs, "Gemini quota exceeded");
                }
            }
            return Err(error);
        }

        let body = response.text().await.map_err(network_error)?;
        let text = (wire.extract_text)(&body).inspect_err(|_| {
            warn!(body_bytes = body.len(), "No answer text in provider response");
        })?;

        parse_canonical(&text).inspect_err(|error| {
            warn!(error = %error, answer = %text.chars().take(200).collect::<String>(), "Answer did not match the canonical schema");
        })
    }
}

impl Debug for CloudAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudAdapter")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            // Omit `client` field as HTTP clients are not useful to debug
            .finish_non_exhaustive()
    }
}
