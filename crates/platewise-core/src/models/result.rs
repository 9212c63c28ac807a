// ABOUTME: Canonical meal-analysis result produced by every provider adapter
// ABOUTME: Tolerates loosely-typed model output and coerces unknown ratings to yellow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Coarse healthiness classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Healthy
    Green,
    /// Moderate, also the fallback for anything unrecognized
    #[default]
    Yellow,
    /// Unhealthy
    Red,
}

impl Rating {
    /// Resolve a free-form label, coercing anything out of set to `Yellow`
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "green" => Self::Green,
            "red" => Self::Red,
            _ => Self::Yellow,
        }
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }

    /// Capitalized name for display
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::Red => "Red",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Normalized answer shape every adapter produces.
///
/// `rating` keeps whatever label the provider returned; use
/// [`CanonicalResult::rating_category`] when categorizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResult {
    /// Short name of the food
    pub food_name: String,
    /// Total calorie estimate
    #[serde(deserialize_with = "deserialize_calories")]
    pub calorie_estimate: u32,
    /// Raw rating label as returned
    #[serde(default, deserialize_with = "deserialize_label")]
    pub rating: String,
    /// Free-text justification
    #[serde(default)]
    pub reasoning: String,
}

impl CanonicalResult {
    /// Build a result from already-normalized parts
    #[must_use]
    pub fn new(
        food_name: impl Into<String>,
        calorie_estimate: u32,
        rating: Rating,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            food_name: food_name.into(),
            calorie_estimate,
            rating: rating.as_str().to_owned(),
            reasoning: reasoning.into(),
        }
    }

    /// Rating resolved to one of the three categories
    #[must_use]
    pub fn rating_category(&self) -> Rating {
        Rating::from_label(&self.rating)
    }
}

/// Accept integers, non-negative floats (rounded) and numeric strings.
fn deserialize_calories<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| de::Error::custom(format!("calorieEstimate is not a number: {value}")))?;

    if !number.is_finite() || number < 0.0 || number > f64::from(u32::MAX) {
        return Err(de::Error::custom(format!(
            "calorieEstimate out of range: {number}"
        )));
    }
    Ok(number.round() as u32)
}

/// Any JSON value becomes a label; non-strings never fail decoding.
fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
