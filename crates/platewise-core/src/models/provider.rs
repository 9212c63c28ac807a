// ABOUTME: Closed set of analysis providers with their build-time descriptors
// ABOUTME: Each provider carries its endpoint, authentication style, and model identifier
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// How a provider expects its credential to be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// Raw key in a custom request header
    Header(&'static str),
    /// `Authorization: Bearer <key>`
    Bearer,
    /// Key passed as a query-string parameter
    QueryKey(&'static str),
    /// No credential required
    None,
}

/// Static description of a provider, fixed at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    /// Default endpoint (for Gemini, the models base URL)
    pub endpoint: &'static str,
    /// Authentication style
    pub auth: AuthStyle,
    /// Default model identifier
    pub model: &'static str,
}

/// A backend capable of analyzing a meal photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// Anthropic Claude (Messages API)
    Claude,
    /// `OpenAI` chat completions
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini `generateContent`
    Gemini,
    /// Local food classifier with a nutrition table
    OnDevice,
}

impl ProviderId {
    /// Every provider, in declaration order
    pub const ALL: [Self; 4] = [Self::Claude, Self::OpenAi, Self::Gemini, Self::OnDevice];

    /// Stable identifier, also the presentation sort key
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::OnDevice => "on_device",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Gemini",
            Self::OnDevice => "On-Device ML",
        }
    }

    /// Whether this provider is reached over the network and needs a credential
    #[must_use]
    pub const fn is_cloud(&self) -> bool {
        !matches!(self, Self::OnDevice)
    }

    /// Build-time endpoint, auth style and model
    #[must_use]
    pub const fn descriptor(&self) -> ProviderDescriptor {
        match self {
            Self::Claude => ProviderDescriptor {
                endpoint: "https://api.anthropic.com/v1/messages",
                auth: AuthStyle::Header("x-api-key"),
                model: "claude-sonnet-4-20250514",
            },
            Self::OpenAi => ProviderDescriptor {
                endpoint: "https://api.openai.com/v1/chat/completions",
                auth: AuthStyle::Bearer,
                model: "gpt-4o",
            },
            Self::Gemini => ProviderDescriptor {
                endpoint: "https://generativelanguage.googleapis.com/v1beta/models",
                auth: AuthStyle::QueryKey("key"),
                model: "gemini-2.0-flash",
            },
            Self::OnDevice => ProviderDescriptor {
                endpoint: "",
                auth: AuthStyle::None,
                model: "food-classifier",
            },
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "openai" | "gpt" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            "on_device" | "on-device" | "ondevice" | "local" | "on-device ml" => Ok(Self::OnDevice),
            other => Err(AppError::invalid_input(format!("unknown provider '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_on_device_is_credential_free() {
        for provider in ProviderId::ALL {
            assert_eq!(
                provider.is_cloud(),
                provider.descriptor().auth != AuthStyle::None,
                "{provider}"
            );
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Anthropic".parse::<ProviderId>().unwrap(), ProviderId::Claude);
        assert_eq!("on-device".parse::<ProviderId>().unwrap(), ProviderId::OnDevice);
        assert!("bard".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_serde_uses_identifiers() {
        let json = serde_json::to_string(&[ProviderId::OpenAi, ProviderId::OnDevice]).unwrap();
        assert_eq!(json, r#"["openai","on_device"]"#);
    }
}
