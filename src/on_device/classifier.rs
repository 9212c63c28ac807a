// ABOUTME: Local food image classification behind a pluggable trait
// ABOUTME: Nearest-centroid colour model loaded from JSON, run on the rayon pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Food Classifier
//!
//! [`ImageClassifier`] is the seam between the on-device adapter and whatever
//! model backs it. The bundled [`CentroidClassifier`] is a small colour
//! model: the image is centre-cropped to a square, its mean RGB is compared
//! against a centroid per label, and distances become confidences through a
//! temperature-scaled softmax.
//!
//! Classification is CPU-bound, so [`classify_in_background`] hands it to the
//! rayon pool and awaits a oneshot completion instead of blocking an async
//! worker thread.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use platewise_core::{AnalysisError, AppError, AppResult};
use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::debug;

/// Candidates at or below this confidence are discarded
pub const MIN_CONFIDENCE: f32 = 0.1;

/// One candidate label with its confidence in `0.0..=1.0`
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Raw model label, e.g. `apple_pie`
    pub label: String,
    /// Confidence in `0.0..=1.0`
    pub confidence: f32,
}

/// A model that labels food photos
pub trait ImageClassifier: Send + Sync {
    /// Classify a decoded image, returning candidates sorted by descending confidence.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ClassificationFailed`] when the model cannot
    /// produce observations for the image.
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Classification>, AnalysisError>;
}

#[derive(Debug, Clone, Deserialize)]
struct LabelCentroid {
    label: String,
    centroid: [f32; 3],
}

fn default_temperature() -> f32 {
    0.05
}

/// Model asset layout
#[derive(Debug, Clone, Deserialize)]
struct CentroidModel {
    labels: Vec<LabelCentroid>,
    #[serde(default = "default_temperature")]
    temperature: f32,
}

/// Nearest-centroid colour classifier
#[derive(Debug, Clone)]
pub struct CentroidClassifier {
    labels: Vec<LabelCentroid>,
    temperature: f32,
}

impl CentroidClassifier {
    /// Parse a model asset.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON and an invalid-config
    /// error for an empty label set or a non-positive temperature.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let model: CentroidModel = serde_json::from_str(json)?;
        if model.labels.is_empty() {
            return Err(AppError::config_invalid("classifier model has no labels"));
        }
        if !(model.temperature.is_finite() && model.temperature > 0.0) {
            return Err(AppError::config_invalid(format!(
                "classifier temperature must be positive, got {}",
                model.temperature
            )));
        }
        Ok(Self {
            labels: model.labels,
            temperature: model.temperature,
        })
    }

    /// Load a model asset from disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or any error from
    /// [`Self::from_json`].
    pub fn load(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Number of labels the model knows
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}

/// Mean RGB of the centred square crop, channels in `0.0..=1.0`
fn center_crop_mean(image: &DynamicImage) -> Option<[f32; 3]> {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    if side == 0 {
        return None;
    }
    let crop = image
        .crop_imm((width - side) / 2, (height - side) / 2, side, side)
        .to_rgb8();

    let mut sums = [0_f64; 3];
    for pixel in crop.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += f64::from(channel);
        }
    }
    let count = f64::from(side) * f64::from(side) * 255.0;
    Some(sums.map(|sum| (sum / count) as f32))
}

impl ImageClassifier for CentroidClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Classification>, AnalysisError> {
        let mean = center_crop_mean(image).ok_or(AnalysisError::ClassificationFailed)?;

        let logits: Vec<f32> = self
            .labels
            .iter()
            .map(|entry| {
                let distance = entry
                    .centroid
                    .iter()
                    .zip(mean)
                    .map(|(c, m)| (c - m).powi(2))
                    .sum::<f32>()
                    .sqrt();
                -distance / self.temperature
            })
            .collect();

        // Shift by the max logit so exp never overflows
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let weights: Vec<f32> = logits.iter().map(|logit| (logit - max).exp()).collect();
        let total: f32 = weights.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(AnalysisError::ClassificationFailed);
        }

        let mut observations: Vec<Classification> = self
            .labels
            .iter()
            .zip(weights)
            .map(|(entry, weight)| Classification {
                label: entry.label.clone(),
                confidence: weight / total,
            })
            .collect();
        observations.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(observations)
    }
}

/// Decode `bytes`, classify on the rayon pool and keep candidates above
/// [`MIN_CONFIDENCE`], most confident first.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidImage`] when the bytes are not a decodable
/// image, [`AnalysisError::ClassificationFailed`] when the model fails or no
/// candidate survives the confidence filter, and [`AnalysisError::TaskFailed`]
/// if the pool drops the job without completing it.
pub async fn classify_in_background(
    classifier: Arc<dyn ImageClassifier>,
    bytes: Arc<[u8]>,
) -> Result<Vec<Classification>, AnalysisError> {
    let (tx, rx) = oneshot::channel();

    rayon::spawn(move || {
        let outcome = image::load_from_memory(&bytes)
            .map_err(|e| AnalysisError::InvalidImage(e.to_string()))
            .and_then(|decoded| classifier.classify(&decoded));
        // Receiver is gone when the comparison was abandoned
        let _ = tx.send(outcome);
    });

    let observations = rx
        .await
        .map_err(|_| AnalysisError::TaskFailed("classification job dropped".to_owned()))??;

    let mut surviving: Vec<Classification> = observations
        .into_iter()
        .filter(|candidate| candidate.confidence > MIN_CONFIDENCE)
        .collect();
    // Classifiers are not trusted to return candidates in order
    surviving.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    debug!(candidates = surviving.len(), "Classification finished");

    if surviving.is_empty() {
        return Err(AnalysisError::ClassificationFailed);
    }
    Ok(surviving)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const MODEL: &str = r#"{
        "temperature": 0.05,
        "labels": [
            {"label": "caesar_salad", "centroid": [0.35, 0.6, 0.25]},
            {"label": "tomato_soup", "centroid": [0.8, 0.2, 0.1]},
            {"label": "rice", "centroid": [0.95, 0.95, 0.92]}
        ]
    }"#;

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 24, Rgb([r, g, b])))
    }

    #[test]
    fn test_nearest_centroid_ranks_first() {
        let classifier = CentroidClassifier::from_json(MODEL).unwrap();
        let observations = classifier.classify(&solid(204, 51, 26)).unwrap();
        assert_eq!(observations[0].label, "tomato_soup");
        assert!(observations[0].confidence > 0.9);
        let total: f32 = observations.iter().map(|o| o.confidence).sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert!(observations
            .windows(2)
            .all(|pair| pair[0].confidence >= pair[1].confidence));
    }

    #[test]
    fn test_center_crop_ignores_borders() {
        // Green centre square flanked by white bars
        let mut image = RgbImage::from_pixel(30, 10, Rgb([255, 255, 255]));
        for x in 10..20 {
            for y in 0..10 {
                image.put_pixel(x, y, Rgb([89, 153, 64]));
            }
        }
        let mean = center_crop_mean(&DynamicImage::ImageRgb8(image)).unwrap();
        assert!((mean[1] - 0.6).abs() < 0.01);
    }

    #[test]
    fn test_rejects_bad_assets() {
        assert!(CentroidClassifier::from_json(r#"{"labels": []}"#).is_err());
        assert!(CentroidClassifier::from_json(
            r#"{"labels": [{"label": "x", "centroid": [0, 0, 0]}], "temperature": 0}"#
        )
        .is_err());
        assert!(CentroidClassifier::from_json("not json").is_err());
    }

    struct Uncertain;

    impl ImageClassifier for Uncertain {
        fn classify(&self, _image: &DynamicImage) -> Result<Vec<Classification>, AnalysisError> {
            Ok((0..20)
                .map(|i| Classification {
                    label: format!("dish_{i}"),
                    confidence: 0.05,
                })
                .collect())
        }
    }

    fn png(r: u8, g: u8, b: u8) -> Arc<[u8]> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        solid(r, g, b)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        Arc::from(buffer.into_inner())
    }

    #[tokio::test]
    async fn test_low_confidence_is_classification_failure() {
        let result = classify_in_background(Arc::new(Uncertain), png(1, 2, 3)).await;
        assert_eq!(result, Err(AnalysisError::ClassificationFailed));
    }

    #[tokio::test]
    async fn test_background_classification() {
        let classifier: Arc<dyn ImageClassifier> =
            Arc::new(CentroidClassifier::from_json(MODEL).unwrap());
        let top = classify_in_background(classifier, png(242, 242, 235))
            .await
            .unwrap();
        assert_eq!(top[0].label, "rice");
        assert!(top.iter().all(|c| c.confidence > MIN_CONFIDENCE));
    }

    struct Unordered;

    impl ImageClassifier for Unordered {
        fn classify(&self, _image: &DynamicImage) -> Result<Vec<Classification>, AnalysisError> {
            Ok(vec![
                Classification {
                    label: "rice".to_owned(),
                    confidence: 0.2,
                },
                Classification {
                    label: "pho".to_owned(),
                    confidence: 0.05,
                },
                Classification {
                    label: "tomato_soup".to_owned(),
                    confidence: 0.7,
                },
            ])
        }
    }

    #[tokio::test]
    async fn test_unordered_candidates_come_back_sorted() {
        let top = classify_in_background(Arc::new(Unordered), png(10, 20, 30))
            .await
            .unwrap();
        let labels: Vec<_> = top.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["tomato_soup", "rice"]);
    }

    #[tokio::test]
    async fn test_undecodable_bytes() {
        let classifier: Arc<dyn ImageClassifier> =
            Arc::new(CentroidClassifier::from_json(MODEL).unwrap());
        let result = classify_in_background(classifier, Arc::from(&b"not an image"[..])).await;
        assert!(matches!(result, Err(AnalysisError::InvalidImage(_))));
    }
}
