// ABOUTME: Turns a completed comparison plus the caller's choices into feedback records
// ABOUTME: Latency samples for every success, preferences and meal drafts for chosen providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Selection and Feedback
//!
//! The core never persists anything. After a comparison completes the caller
//! picks zero or more successful providers and [`Selection::new`] derives:
//!
//! - one [`LatencySample`] per success, chosen or not
//! - one [`PreferenceEvent`] per chosen provider
//! - one [`MealDraft`] per chosen provider
//!
//! A [`FeedbackSink`] receives them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use platewise_core::{
    AppError, AppResult, LatencySample, MealDraft, PreferenceEvent, ProviderId,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::comparison::ComparisonReport;

/// Feedback records derived from one comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// One per success, sorted by provider identifier
    pub latency_samples: Vec<LatencySample>,
    /// One per chosen provider
    pub preferences: Vec<PreferenceEvent>,
    /// One per chosen provider
    pub meals: Vec<MealDraft>,
}

impl Selection {
    /// Derive records for `chosen` at `now`.
    ///
    /// Duplicate choices count once.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when a chosen provider is not among
    /// the report's successes.
    pub fn new(
        report: &ComparisonReport,
        chosen: &[ProviderId],
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let mut unique: Vec<ProviderId> = Vec::with_capacity(chosen.len());
        for provider in chosen {
            if !unique.contains(provider) {
                unique.push(*provider);
            }
        }

        let mut preferences = Vec::with_capacity(unique.len());
        let mut meals = Vec::with_capacity(unique.len());
        for provider in unique {
            let success = report.success(provider).ok_or_else(|| {
                AppError::invalid_input(format!(
                    "{} did not produce a result and cannot be chosen",
                    provider.display_name()
                ))
            })?;
            preferences.push(PreferenceEvent::new(provider, now));
            meals.push(MealDraft {
                provider,
                food_name: success.result.food_name.clone(),
                calorie_estimate: success.result.calorie_estimate,
                rating: success.result.rating_category(),
                timestamp: report.captured_at.unwrap_or(now),
            });
        }

        let latency_samples = report
            .successes
            .iter()
            .map(|success| LatencySample {
                provider: success.provider,
                elapsed: success.elapsed,
                recorded_at: now,
            })
            .collect();

        Ok(Self {
            latency_samples,
            preferences,
            meals,
        })
    }
}

impl ComparisonReport {
    /// Choose winners now; see [`Selection::new`].
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when a chosen provider did not succeed.
    pub fn select(&self, chosen: &[ProviderId]) -> AppResult<Selection> {
        Selection::new(self, chosen, Utc::now())
    }
}

/// External store for feedback records
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Record a latency sample
    ///
    /// # Errors
    /// Returns an error if the sample cannot be stored
    async fn record_latency(&self, sample: LatencySample) -> AppResult<()>;

    /// Record a preference
    ///
    /// # Errors
    /// Returns an error if the event cannot be stored
    async fn record_preference(&self, event: PreferenceEvent) -> AppResult<()>;

    /// Store a chosen meal
    ///
    /// # Errors
    /// Returns an error if the meal cannot be stored
    async fn save_meal(&self, meal: MealDraft) -> AppResult<()>;
}

/// Hand every record in `selection` to `sink`, stopping at the first error.
///
/// # Errors
///
/// Propagates the sink's error.
pub async fn submit(selection: Selection, sink: &dyn FeedbackSink) -> AppResult<()> {
    let counts = (
        selection.latency_samples.len(),
        selection.preferences.len(),
        selection.meals.len(),
    );
    for sample in selection.latency_samples {
        sink.record_latency(sample).await?;
    }
    for event in selection.preferences {
        sink.record_preference(event).await?;
    }
    for meal in selection.meals {
        sink.save_meal(meal).await?;
    }
    info!(
        latency_samples = counts.0,
        preferences = counts.1,
        meals = counts.2,
        "Feedback submitted"
    );
    Ok(())
}

/// Sink that keeps everything in memory
#[derive(Debug, Default)]
pub struct InMemoryFeedbackSink {
    latencies: Mutex<Vec<LatencySample>>,
    preferences: Mutex<Vec<PreferenceEvent>>,
    meals: Mutex<Vec<MealDraft>>,
}

impl InMemoryFeedbackSink {
    /// Empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded latency samples
    pub async fn latencies(&self) -> Vec<LatencySample> {
        self.latencies.lock().await.clone()
    }

    /// Recorded preference events
    pub async fn preferences(&self) -> Vec<PreferenceEvent> {
        self.preferences.lock().await.clone()
    }

    /// Saved meals
    pub async fn meals(&self) -> Vec<MealDraft> {
        self.meals.lock().await.clone()
    }

    /// Preference count per provider
    pub async fn preference_counts(&self) -> Vec<(ProviderId, usize)> {
        let events = self.preferences.lock().await;
        ProviderId::ALL
            .into_iter()
            .map(|provider| {
                (
                    provider,
                    events.iter().filter(|e| e.provider == provider).count(),
                )
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Mean latency in seconds per provider
    pub async fn average_latency(&self, provider: ProviderId) -> Option<f64> {
        let samples = self.latencies.lock().await;
        let matching: Vec<f64> = samples
            .iter()
            .filter(|s| s.provider == provider)
            .map(LatencySample::seconds)
            .collect();
        if matching.is_empty() {
            return None;
        }
        Some(matching.iter().sum::<f64>() / matching.len() as f64)
    }
}

#[async_trait]
impl FeedbackSink for InMemoryFeedbackSink {
    async fn record_latency(&self, sample: LatencySample) -> AppResult<()> {
        debug!(provider = sample.provider.as_str(), seconds = sample.seconds(), "Latency recorded");
        self.latencies.lock().await.push(sample);
        Ok(())
    }

    async fn record_preference(&self, event: PreferenceEvent) -> AppResult<()> {
        self.preferences.lock().await.push(event);
        Ok(())
    }

    async fn save_meal(&self, meal: MealDraft) -> AppResult<()> {
        self.meals.lock().await.push(meal);
        Ok(())
    }
}
