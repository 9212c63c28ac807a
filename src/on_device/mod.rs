// ABOUTME: On-device meal analysis from a local classifier and a nutrition table
// ABOUTME: Needs no network or credential; unavailable when the model asset is missing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # On-Device Provider
//!
//! The model asset is loaded once at construction. A missing or unreadable
//! asset leaves the adapter unavailable and every [`OnDeviceAdapter::analyze`]
//! call fails with [`AnalysisError::ModelUnavailable`] without touching the
//! image.
//!
//! A nutrition miss is still a success: classification worked, so the answer
//! carries a conservative estimate instead.

/// Classifier trait, centroid model, and background execution
pub mod classifier;
/// Food name to nutrition facts table
pub mod nutrition;

pub use classifier::{
    classify_in_background, CentroidClassifier, Classification, ImageClassifier, MIN_CONFIDENCE,
};
pub use nutrition::{NutritionInfo, NutritionTable};

use std::fmt;
use std::sync::Arc;

use platewise_core::{AnalysisError, AppResult, CanonicalResult, Rating};
use tracing::{debug, info, instrument, warn};

use crate::config::AnalysisConfig;

/// Calorie estimate used when the label has no nutrition entry
pub const FALLBACK_CALORIES: u32 = 250;

/// Local classifier plus nutrition lookup
pub struct OnDeviceAdapter {
    classifier: Option<Arc<dyn ImageClassifier>>,
    nutrition: NutritionTable,
}

impl OnDeviceAdapter {
    /// Build from configuration.
    ///
    /// An absent or malformed model asset is not an error: the adapter is
    /// created unavailable.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured nutrition table override cannot be
    /// loaded, or the bundled table is malformed.
    pub fn from_config(config: &AnalysisConfig) -> AppResult<Self> {
        let nutrition = match &config.nutrition_path {
            Some(path) => NutritionTable::load(path)?,
            None => NutritionTable::bundled()?,
        };

        let classifier = config.model_path.as_deref().and_then(|path| {
            if !path.exists() {
                info!(path = %path.display(), "On-device model asset not found");
                return None;
            }
            match CentroidClassifier::load(path) {
                Ok(model) => {
                    info!(path = %path.display(), labels = model.label_count(), "Loaded on-device model");
                    Some(Arc::new(model) as Arc<dyn ImageClassifier>)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "On-device model could not be loaded");
                    None
                }
            }
        });

        Ok(Self {
            classifier,
            nutrition,
        })
    }

    /// Adapter backed by an already-loaded classifier
    #[must_use]
    pub fn with_classifier(classifier: Arc<dyn ImageClassifier>, nutrition: NutritionTable) -> Self {
        Self {
            classifier: Some(classifier),
            nutrition,
        }
    }

    /// Adapter with no model
    #[must_use]
    pub fn unavailable(nutrition: NutritionTable) -> Self {
        Self {
            classifier: None,
            nutrition,
        }
    }

    /// Whether a model is loaded
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    /// Nutrition table in use
    #[must_use]
    pub const fn nutrition(&self) -> &NutritionTable {
        &self.nutrition
    }

    /// Classify the photo and attach nutrition facts for the top label.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::ModelUnavailable`] without a model,
    /// [`AnalysisError::InvalidImage`] for undecodable bytes, and
    /// [`AnalysisError::ClassificationFailed`] when no candidate is confident
    /// enough.
    #[instrument(skip_all, fields(provider = "on_device"))]
    pub async fn analyze(&self, image: Arc<[u8]>) -> Result<CanonicalResult, AnalysisError> {
        let Some(classifier) = &self.classifier else {
            return Err(AnalysisError::ModelUnavailable);
        };

        let candidates = classify_in_background(Arc::clone(classifier), image).await?;
        let top = candidates
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .ok_or(AnalysisError::ClassificationFailed)?;

        let food_name = format_food_name(&top.label);
        let confidence = confidence_percent(top.confidence);
        debug!(label = %top.label, confidence, "Top classification");

        Ok(match self.nutrition.lookup(&top.label) {
            Some(info) => CanonicalResult::new(
                food_name.clone(),
                info.calories_per_serving,
                Rating::from_label(&info.category),
                format!(
                    "Identified as {food_name} ({confidence}% confidence). {}.",
                    info.serving_size
                ),
            ),
            None => CanonicalResult::new(
                food_name.clone(),
                FALLBACK_CALORIES,
                Rating::Yellow,
                format!(
                    "Identified as {food_name} ({confidence}% confidence). Nutritional data not available - using estimate."
                ),
            ),
        })
    }
}

impl fmt::Debug for OnDeviceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnDeviceAdapter")
            .field("available", &self.is_available())
            .field("nutrition_entries", &self.nutrition.all_food_names().len())
            .finish()
    }
}

/// `apple_pie` to `Apple Pie`
#[must_use]
pub fn format_food_name(label: &str) -> String {
    label
        .split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole percent, truncated
fn confidence_percent(confidence: f32) -> u32 {
    (confidence.clamp(0.0, 1.0) * 100.0) as u32
}
