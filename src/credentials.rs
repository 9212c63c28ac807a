// ABOUTME: Credential lookup for cloud analysis providers
// ABOUTME: Environment-backed source for production and a static map for injection in tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::env;

use platewise_core::ProviderId;

/// Where provider API keys come from.
///
/// Keys are read once per comparison, when eligibility is decided.
pub trait CredentialSource: Send + Sync {
    /// Credential for `provider`, `None` when absent or empty
    fn get_credential(&self, provider: ProviderId) -> Option<String>;

    /// Whether `provider` can be attempted; the on-device provider never needs a key
    fn has_credential(&self, provider: ProviderId) -> bool {
        !provider.is_cloud() || self.get_credential(provider).is_some()
    }
}

/// Environment variable holding each cloud provider's key
#[must_use]
pub const fn env_var_name(provider: ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::Claude => Some("ANTHROPIC_API_KEY"),
        ProviderId::OpenAi => Some("OPENAI_API_KEY"),
        ProviderId::Gemini => Some("GEMINI_API_KEY"),
        ProviderId::OnDevice => None,
    }
}

/// Reads `ANTHROPIC_API_KEY`, `OPENAI_API_KEY` and `GEMINI_API_KEY`
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialSource;

impl CredentialSource for EnvCredentialSource {
    fn get_credential(&self, provider: ProviderId) -> Option<String> {
        env::var(env_var_name(provider)?)
            .ok()
            .map(|key| key.trim().to_owned())
            .filter(|key| !key.is_empty())
    }
}

/// Fixed set of credentials
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    keys: HashMap<ProviderId, String>,
}

impl StaticCredentials {
    /// No credentials at all
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key for `provider`
    #[must_use]
    pub fn with(mut self, provider: ProviderId, key: impl Into<String>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn get_credential(&self, provider: ProviderId) -> Option<String> {
        self.keys
            .get(&provider)
            .filter(|key| !key.is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_on_device_needs_no_credential() {
        let empty = StaticCredentials::new();
        assert!(empty.has_credential(ProviderId::OnDevice));
        assert!(!empty.has_credential(ProviderId::Claude));
    }

    #[test]
    fn test_empty_static_key_is_absent() {
        let creds = StaticCredentials::new()
            .with(ProviderId::Gemini, "")
            .with(ProviderId::OpenAi, "sk-1");
        assert!(!creds.has_credential(ProviderId::Gemini));
        assert_eq!(creds.get_credential(ProviderId::OpenAi).as_deref(), Some("sk-1"));
    }

    #[test]
    #[serial]
    fn test_env_source() {
        env::set_var("ANTHROPIC_API_KEY", " sk-ant ");
        env::set_var("OPENAI_API_KEY", "");
        env::remove_var("GEMINI_API_KEY");

        let source = EnvCredentialSource;
        assert_eq!(source.get_credential(ProviderId::Claude).as_deref(), Some("sk-ant"));
        assert!(!source.has_credential(ProviderId::OpenAi));
        assert!(!source.has_credential(ProviderId::Gemini));
        assert!(source.has_credential(ProviderId::OnDevice));

        env::remove_var("ANTHROPIC_API_KEY");
        env::remove_var("OPENAI_API_KEY");
    }
}
