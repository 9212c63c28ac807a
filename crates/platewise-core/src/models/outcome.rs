// ABOUTME: Settled result of one provider attempt, tagged with provider and elapsed time
// ABOUTME: Outcomes are immutable once created by the orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::Serialize;
use std::time::Duration;

use super::{CanonicalResult, ProviderId};
use crate::errors::AnalysisError;

/// A provider that produced a canonical result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSuccess {
    /// Provider that answered
    pub provider: ProviderId,
    /// Normalized answer
    pub result: CanonicalResult,
    /// Time spent in the adapter call
    pub elapsed: Duration,
}

/// A provider attempt that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    /// Provider that failed
    pub provider: ProviderId,
    /// Failure kind
    pub error: AnalysisError,
    /// Time spent before failing
    pub elapsed: Duration,
}

/// Either a canonical result or a failure kind, for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The provider produced a canonical result
    Success(ProviderSuccess),
    /// The provider attempt failed
    Failure(ProviderFailure),
}

impl AttemptOutcome {
    /// Build an outcome from an adapter result
    #[must_use]
    pub fn from_result(
        provider: ProviderId,
        result: Result<CanonicalResult, AnalysisError>,
        elapsed: Duration,
    ) -> Self {
        match result {
            Ok(result) => Self::Success(ProviderSuccess {
                provider,
                result,
                elapsed,
            }),
            Err(error) => Self::Failure(ProviderFailure {
                provider,
                error,
                elapsed,
            }),
        }
    }

    /// Provider this outcome belongs to
    #[must_use]
    pub const fn provider(&self) -> ProviderId {
        match self {
            Self::Success(success) => success.provider,
            Self::Failure(failure) => failure.provider,
        }
    }

    /// Elapsed time of the attempt
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Success(success) => success.elapsed,
            Self::Failure(failure) => failure.elapsed,
        }
    }

    /// Whether the attempt succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
