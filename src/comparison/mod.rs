// ABOUTME: Concurrent multi-provider meal analysis with per-provider failure isolation
// ABOUTME: Fans out one task per eligible provider and collects every outcome into a report
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Comparison Orchestrator
//!
//! [`Orchestrator::compare_all`] spawns one tokio task per eligible provider.
//! Each task times its own adapter call with a monotonic clock and sends a
//! single [`AttemptOutcome`] over a channel whose only consumer is the
//! [`ComparisonSession`]. The fan-in waits for every task (no early exit,
//! no retry) and the report is sorted by provider identifier.
//!
//! A cloud provider is eligible only when the credential source has a key
//! for it; the on-device provider is always eligible and reports
//! `ModelUnavailable` itself when it has no model.
//!
//! Dropping the future returned by `compare_all` abandons the spawned tasks.
//! They run to completion and their outcomes are discarded.

/// Outcome accumulation for one fan-out/fan-in cycle
pub mod session;

pub use session::{ComparisonSession, SessionState};

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use platewise_core::{
    AnalysisError, AnalysisRequest, AppError, AppResult, AttemptOutcome, CanonicalResult,
    ProviderFailure, ProviderId, ProviderSuccess,
};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::config::AnalysisConfig;
use crate::credentials::{CredentialSource, EnvCredentialSource};
use crate::llm::{CloudAdapter, CloudProvider};
use crate::on_device::OnDeviceAdapter;

/// A provider ready to analyze, with its credential already bound
#[derive(Debug)]
pub enum Analyzer {
    /// Network-backed provider
    Cloud(CloudAdapter),
    /// Local classifier
    OnDevice(Arc<OnDeviceAdapter>),
}

impl Analyzer {
    /// Provider identity
    #[must_use]
    pub const fn provider(&self) -> ProviderId {
        match self {
            Self::Cloud(adapter) => adapter.provider(),
            Self::OnDevice(_) => ProviderId::OnDevice,
        }
    }

    /// Run the provider's analysis.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`AnalysisError`].
    pub async fn analyze(&self, image: Arc<[u8]>) -> Result<CanonicalResult, AnalysisError> {
        match self {
            Self::Cloud(adapter) => adapter.analyze(image).await,
            Self::OnDevice(adapter) => adapter.analyze(image).await,
        }
    }

    /// Analyze and time the call
    async fn attempt(&self, image: Arc<[u8]>) -> AttemptOutcome {
        let provider = self.provider();
        let started = Instant::now();
        let result = self.analyze(image).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(answer) => info!(
                provider = provider.as_str(),
                elapsed_ms = elapsed.as_millis(),
                food = %answer.food_name,
                calories = answer.calorie_estimate,
                "Provider succeeded"
            ),
            Err(error) => warn!(
                provider = provider.as_str(),
                elapsed_ms = elapsed.as_millis(),
                kind = error.kind(),
                error = %error,
                "Provider failed"
            ),
        }
        AttemptOutcome::from_result(provider, result, elapsed)
    }
}

/// Partitioned outcomes of one comparison, each list sorted by provider identifier
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    /// Providers that produced a canonical result
    pub successes: Vec<ProviderSuccess>,
    /// Providers that failed
    pub failures: Vec<ProviderFailure>,
    /// Capture timestamp carried over from the request
    pub captured_at: Option<DateTime<Utc>>,
}

impl ComparisonReport {
    /// Partition and sort settled outcomes
    #[must_use]
    pub fn from_outcomes(
        outcomes: Vec<AttemptOutcome>,
        captured_at: Option<DateTime<Utc>>,
    ) -> Self {
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                AttemptOutcome::Success(success) => successes.push(success),
                AttemptOutcome::Failure(failure) => failures.push(failure),
            }
        }
        successes.sort_by_key(|s| s.provider.as_str());
        failures.sort_by_key(|f| f.provider.as_str());

        Self {
            successes,
            failures,
            captured_at,
        }
    }

    /// Number of attempted providers
    #[must_use]
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Success for `provider`, if it answered
    #[must_use]
    pub fn success(&self, provider: ProviderId) -> Option<&ProviderSuccess> {
        self.successes.iter().find(|s| s.provider == provider)
    }

    /// Failure for `provider`, if it failed
    #[must_use]
    pub fn failure(&self, provider: ProviderId) -> Option<&ProviderFailure> {
        self.failures.iter().find(|f| f.provider == provider)
    }

    /// One line per failure, only when nothing succeeded.
    ///
    /// With at least one success the failures are shown alongside the
    /// results instead, so this returns `None`.
    #[must_use]
    pub fn failure_summary(&self) -> Option<String> {
        if !self.successes.is_empty() || self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(|f| format!("{}: {}", f.provider.display_name(), f.error.description()))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Runs comparisons across every eligible provider
pub struct Orchestrator {
    config: AnalysisConfig,
    credentials: Arc<dyn CredentialSource>,
    on_device: Arc<OnDeviceAdapter>,
    client: Client,
}

impl Orchestrator {
    /// Build an orchestrator from explicit dependencies.
    ///
    /// HTTP calls have no connect or request timeout unless
    /// [`AnalysisConfig::request_timeout`] is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        config: AnalysisConfig,
        credentials: Arc<dyn CredentialSource>,
        on_device: OnDeviceAdapter,
    ) -> AppResult<Self> {
        // Unbounded unless a provider timeout is configured
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            credentials,
            on_device: Arc::new(on_device),
            client,
        })
    }

    /// Configuration, credentials and on-device model from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration values, an unreadable
    /// nutrition table override, or HTTP client construction failure.
    pub fn from_env() -> AppResult<Self> {
        let config = AnalysisConfig::from_env()?;
        let on_device = OnDeviceAdapter::from_config(&config)?;
        Self::new(config, Arc::new(EnvCredentialSource), on_device)
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// On-device adapter
    #[must_use]
    pub fn on_device(&self) -> &OnDeviceAdapter {
        &self.on_device
    }

    /// Providers that would be dispatched right now, in declaration order
    #[must_use]
    pub fn eligible_providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|provider| self.credentials.has_credential(*provider))
            .collect()
    }

    /// Bind `provider` to its credential, `None` for a cloud provider without one
    fn analyzer(&self, provider: ProviderId) -> Option<Analyzer> {
        match CloudProvider::from_id(provider) {
            None => Some(Analyzer::OnDevice(Arc::clone(&self.on_device))),
            Some(cloud) => self.credentials.get_credential(provider).map(|key| {
                Analyzer::Cloud(CloudAdapter::new(
                    cloud,
                    &self.config,
                    key,
                    self.client.clone(),
                ))
            }),
        }
    }

    /// Compare every eligible provider
    pub async fn compare_all(&self, request: &AnalysisRequest) -> ComparisonReport {
        self.compare(request, &self.eligible_providers()).await
    }

    /// Compare a chosen subset of providers.
    ///
    /// Cloud providers without a credential are skipped, never dispatched.
    /// Duplicates are dispatched once.
    #[instrument(skip_all, fields(requested = providers.len()))]
    pub async fn compare(
        &self,
        request: &AnalysisRequest,
        providers: &[ProviderId],
    ) -> ComparisonReport {
        let mut analyzers: Vec<Analyzer> = Vec::with_capacity(providers.len());
        for provider in providers {
            if analyzers.iter().any(|a| a.provider() == *provider) {
                continue;
            }
            match self.analyzer(*provider) {
                Some(analyzer) => analyzers.push(analyzer),
                None => debug!(provider = provider.as_str(), "No credential; not dispatched"),
            }
        }

        let mut session = ComparisonSession::new(request.captured_at());
        let (tx, mut rx) = mpsc::channel::<AttemptOutcome>(analyzers.len().max(1));

        for analyzer in analyzers {
            session.dispatch(analyzer.provider());
            let image = request.image_shared();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = analyzer.attempt(image).await;
                if tx.send(outcome).await.is_err() {
                    debug!(
                        provider = analyzer.provider().as_str(),
                        "Comparison abandoned; outcome discarded"
                    );
                }
            });
        }
        drop(tx);

        info!(dispatched = session.dispatched().len(), "Comparison dispatched");
        session.begin_collecting();

        while let Some(outcome) = rx.recv().await {
            session.record(outcome);
        }

        let report = session.complete();
        info!(
            successes = report.successes.len(),
            failures = report.failures.len(),
            "Comparison completed"
        );
        report
    }

    /// Analyze with a single provider, timed the same way as in a comparison.
    ///
    /// A cloud provider without a credential fails with
    /// [`AnalysisError::InvalidCredential`] and no request is made.
    pub async fn analyze_with(
        &self,
        provider: ProviderId,
        request: &AnalysisRequest,
    ) -> AttemptOutcome {
        match self.analyzer(provider) {
            Some(analyzer) => analyzer.attempt(request.image_shared()).await,
            None => AttemptOutcome::from_result(
                provider,
                Err(AnalysisError::InvalidCredential),
                std::time::Duration::ZERO,
            ),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("eligible", &self.eligible_providers())
            .field("on_device", &self.on_device)
            .finish_non_exhaustive()
    }
}
