// ABOUTME: Analysis configuration loaded from environment variables
// ABOUTME: Provider endpoints, models, prompt, preprocessing, and on-device asset locations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration for meal analysis
//!
//! Everything has a working default; environment variables only override.
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `PLATEWISE_ANALYSIS_PROMPT` | Prompt text sent to every cloud provider |
//! | `PLATEWISE_ANALYSIS_PROMPT_FILE` | Read the prompt from a file instead |
//! | `PLATEWISE_{CLAUDE,OPENAI,GEMINI}_MODEL` | Model identifier per provider |
//! | `PLATEWISE_{CLAUDE,OPENAI,GEMINI}_URL` | Endpoint override per provider |
//! | `PLATEWISE_MODEL_PATH` | On-device classifier asset |
//! | `PLATEWISE_NUTRITION_PATH` | Nutrition table replacing the bundled one |
//! | `PLATEWISE_PROVIDER_TIMEOUT_SECS` | Per-request HTTP timeout (unset: none) |

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use platewise_core::{AppError, AppResult, ProviderId};
use tracing::debug;

use crate::imaging::ImageOptions;
use crate::llm::{default_analysis_prompt, CloudProvider};

/// Output token cap for cloud requests
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// File name of the classifier asset under the data directory
const MODEL_FILE_NAME: &str = "food_classifier.json";

/// Where one cloud provider is reached and which model it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudEndpoint {
    /// Request URL (for Gemini, the models base URL)
    pub url: String,
    /// Model identifier
    pub model: String,
}

impl CloudEndpoint {
    /// Build-time endpoint for `provider`
    #[must_use]
    pub fn builtin(provider: CloudProvider) -> Self {
        let descriptor = provider.id().descriptor();
        Self {
            url: descriptor.endpoint.to_owned(),
            model: descriptor.model.to_owned(),
        }
    }
}

/// Settings shared by every adapter in a comparison
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Instruction sent alongside the photo
    pub prompt: Arc<str>,
    /// Upload preprocessing
    pub image: ImageOptions,
    /// Output token cap
    pub max_tokens: u32,
    /// Claude endpoint
    pub claude: CloudEndpoint,
    /// `OpenAI` endpoint
    pub openai: CloudEndpoint,
    /// Gemini endpoint
    pub gemini: CloudEndpoint,
    /// On-device classifier asset, `None` when no data directory exists
    pub model_path: Option<PathBuf>,
    /// Nutrition table override, `None` for the bundled table
    pub nutrition_path: Option<PathBuf>,
    /// Per-request HTTP timeout, `None` for no timeout
    pub request_timeout: Option<Duration>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            prompt: Arc::from(default_analysis_prompt()),
            image: ImageOptions::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            claude: CloudEndpoint::builtin(CloudProvider::Claude),
            openai: CloudEndpoint::builtin(CloudProvider::OpenAi),
            gemini: CloudEndpoint::builtin(CloudProvider::Gemini),
            model_path: default_model_path(),
            nutrition_path: None,
            request_timeout: None,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from environment variables over the defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the prompt file cannot be read or
    /// `PLATEWISE_PROVIDER_TIMEOUT_SECS` is not a positive integer.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(prompt) = non_empty_var("PLATEWISE_ANALYSIS_PROMPT") {
            config.prompt = Arc::from(prompt);
        } else if let Some(path) = non_empty_var("PLATEWISE_ANALYSIS_PROMPT_FILE") {
            let prompt = fs::read_to_string(&path).map_err(|e| {
                AppError::config(format!("cannot read prompt file {path}")).with_source(e)
            })?;
            config.prompt = Arc::from(prompt);
        }

        for (provider, prefix) in [
            (CloudProvider::Claude, "PLATEWISE_CLAUDE"),
            (CloudProvider::OpenAi, "PLATEWISE_OPENAI"),
            (CloudProvider::Gemini, "PLATEWISE_GEMINI"),
        ] {
            let endpoint = config.endpoint_mut(provider);
            endpoint.model = env_var_or(&format!("{prefix}_MODEL"), &endpoint.model);
            endpoint.url = env_var_or(&format!("{prefix}_URL"), &endpoint.url);
        }

        if let Some(path) = non_empty_var("PLATEWISE_MODEL_PATH") {
            config.model_path = Some(PathBuf::from(path));
        }
        config.nutrition_path = non_empty_var("PLATEWISE_NUTRITION_PATH").map(PathBuf::from);

        if let Some(raw) = non_empty_var("PLATEWISE_PROVIDER_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AppError::config_invalid(format!(
                        "PLATEWISE_PROVIDER_TIMEOUT_SECS must be a positive integer, got '{raw}'"
                    ))
                })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        debug!(
            claude_model = %config.claude.model,
            openai_model = %config.openai.model,
            gemini_model = %config.gemini.model,
            model_path = ?config.model_path,
            timeout = ?config.request_timeout,
            "Loaded analysis configuration"
        );
        Ok(config)
    }

    /// Endpoint configured for `provider`
    #[must_use]
    pub const fn endpoint(&self, provider: CloudProvider) -> &CloudEndpoint {
        match provider {
            CloudProvider::Claude => &self.claude,
            CloudProvider::OpenAi => &self.openai,
            CloudProvider::Gemini => &self.gemini,
        }
    }

    fn endpoint_mut(&mut self, provider: CloudProvider) -> &mut CloudEndpoint {
        match provider {
            CloudProvider::Claude => &mut self.claude,
            CloudProvider::OpenAi => &mut self.openai,
            CloudProvider::Gemini => &mut self.gemini,
        }
    }

    /// Model identifier reported for any provider
    #[must_use]
    pub fn model_name(&self, provider: ProviderId) -> &str {
        CloudProvider::from_id(provider).map_or(provider.descriptor().model, |cloud| {
            self.endpoint(cloud).model.as_str()
        })
    }
}

/// `<data dir>/platewise/food_classifier.json`
fn default_model_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("platewise").join(MODEL_FILE_NAME))
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    non_empty_var(key).unwrap_or_else(|| default.to_owned())
}

/// Environment variable, treating empty values as unset
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
