// ABOUTME: Single fan-out/fan-in cycle that accumulates provider outcomes
// ABOUTME: Tracks dispatch, collection and completion; only the orchestrator mutates it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;

use chrono::{DateTime, Utc};
use platewise_core::{AnalysisError, AttemptOutcome, ProviderId};
use serde::Serialize;
use tracing::warn;

use super::ComparisonReport;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing dispatched yet
    Idle,
    /// Tasks are being spawned
    Dispatching {
        /// Tasks spawned so far
        outstanding: usize,
    },
    /// Waiting for tasks to settle
    Collecting {
        /// Outcomes received
        settled: usize,
        /// Tasks still running
        outstanding: usize,
    },
    /// Every task settled; terminal
    Completed,
}

/// Outcomes of one comparison, owned by the orchestrator until completion
#[derive(Debug)]
pub struct ComparisonSession {
    captured_at: Option<DateTime<Utc>>,
    dispatched: Vec<ProviderId>,
    outcomes: Vec<AttemptOutcome>,
    state: SessionState,
}

impl ComparisonSession {
    /// Fresh session in [`SessionState::Idle`]
    #[must_use]
    pub const fn new(captured_at: Option<DateTime<Utc>>) -> Self {
        Self {
            captured_at,
            dispatched: Vec::new(),
            outcomes: Vec::new(),
            state: SessionState::Idle,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Providers dispatched in this session
    #[must_use]
    pub fn dispatched(&self) -> &[ProviderId] {
        &self.dispatched
    }

    /// Record that a task was spawned for `provider`
    pub fn dispatch(&mut self, provider: ProviderId) {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Dispatching { outstanding: 1 };
            }
            SessionState::Dispatching { outstanding } => {
                self.state = SessionState::Dispatching {
                    outstanding: outstanding + 1,
                };
            }
            SessionState::Collecting { .. } | SessionState::Completed => {
                warn!(provider = provider.as_str(), state = ?self.state, "Dispatch after fan-out closed; ignored");
                return;
            }
        }
        self.dispatched.push(provider);
    }

    /// Stop dispatching and start waiting for outcomes
    pub fn begin_collecting(&mut self) {
        self.state = match self.state {
            SessionState::Idle => SessionState::Collecting {
                settled: 0,
                outstanding: 0,
            },
            SessionState::Dispatching { outstanding } => SessionState::Collecting {
                settled: 0,
                outstanding,
            },
            other => other,
        };
    }

    /// Append one settled outcome.
    ///
    /// Outcomes for providers that were not dispatched, or that already
    /// reported, are dropped.
    pub fn record(&mut self, outcome: AttemptOutcome) {
        let SessionState::Collecting {
            settled,
            outstanding,
        } = self.state
        else {
            warn!(provider = outcome.provider().as_str(), "Outcome outside collection phase; discarded");
            return;
        };

        let provider = outcome.provider();
        if !self.dispatched.contains(&provider) || self.has_outcome(provider) {
            warn!(provider = provider.as_str(), "Unexpected outcome; discarded");
            return;
        }

        self.outcomes.push(outcome);
        self.state = SessionState::Collecting {
            settled: settled + 1,
            outstanding: outstanding.saturating_sub(1),
        };
    }

    fn has_outcome(&self, provider: ProviderId) -> bool {
        self.outcomes.iter().any(|o| o.provider() == provider)
    }

    /// Close the session and partition its outcomes.
    ///
    /// Every dispatched provider that never reported is recorded as
    /// [`AnalysisError::TaskFailed`], so the report always holds one outcome
    /// per dispatched provider.
    pub fn complete(mut self) -> ComparisonReport {
        let missing: Vec<ProviderId> = self
            .dispatched
            .iter()
            .copied()
            .filter(|provider| !self.has_outcome(*provider))
            .collect();
        for provider in missing {
            warn!(provider = provider.as_str(), "Task ended without reporting an outcome");
            self.outcomes.push(AttemptOutcome::from_result(
                provider,
                Err(AnalysisError::TaskFailed(
                    "task ended without reporting an outcome".to_owned(),
                )),
                Duration::ZERO,
            ));
        }
        self.state = SessionState::Completed;
        ComparisonReport::from_outcomes(self.outcomes, self.captured_at)
    }
}
