// ABOUTME: Records handed to the external feedback sink after a comparison
// ABOUTME: Latency samples for every success, preference events and meal drafts for chosen ones
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::{ProviderId, Rating};

/// The caller marked this provider's answer as a winner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceEvent {
    /// Event identifier
    pub id: Uuid,
    /// Chosen provider
    pub provider: ProviderId,
    /// When the choice was made
    pub timestamp: DateTime<Utc>,
}

impl PreferenceEvent {
    /// Create a preference event for `provider` at `timestamp`
    #[must_use]
    pub fn new(provider: ProviderId, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider,
            timestamp,
        }
    }
}

/// How long one successful attempt took
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Provider measured
    pub provider: ProviderId,
    /// Elapsed time of the attempt
    pub elapsed: Duration,
    /// When the sample was taken
    pub recorded_at: DateTime<Utc>,
}

impl LatencySample {
    /// Elapsed time in fractional seconds
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// A chosen answer in the shape the meal store persists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealDraft {
    /// Provider the answer came from
    pub provider: ProviderId,
    /// Food name
    pub food_name: String,
    /// Calorie estimate
    pub calorie_estimate: u32,
    /// Rating coerced to a category
    pub rating: Rating,
    /// Capture timestamp, or selection time when unknown
    pub timestamp: DateTime<Utc>,
}
