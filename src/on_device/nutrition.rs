// ABOUTME: Nutrition lookup table for labels produced by the on-device classifier
// ABOUTME: Bundled JSON table keyed by food name with exact then substring matching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::path::Path;

use platewise_core::AppResult;
use serde::{Deserialize, Serialize};

/// Table shipped with the crate
const BUNDLED_TABLE: &str = include_str!("data/nutrition_data.json");

/// Per-serving nutrition facts for one food
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionInfo {
    /// Calories in one serving
    pub calories_per_serving: u32,
    /// Human-readable serving description
    pub serving_size: String,
    /// `green`, `yellow` or `red`
    pub category: String,
}

/// Food name to nutrition facts
#[derive(Debug, Clone, Default)]
pub struct NutritionTable {
    // Sorted keys keep substring matching deterministic
    entries: BTreeMap<String, NutritionInfo>,
}

impl NutritionTable {
    /// The table compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the bundled JSON is malformed.
    pub fn bundled() -> AppResult<Self> {
        Self::from_json(BUNDLED_TABLE)
    }

    /// Parse a `{ "food name": { caloriesPerServing, servingSize, category } }` table.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed JSON.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let raw: BTreeMap<String, NutritionInfo> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(name, info)| (normalize(&name), info))
            .collect();
        Ok(Self { entries })
    }

    /// Read a table from disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error.
    pub fn load(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Look up a classifier label.
    ///
    /// Exact match on the normalized name first, otherwise the longest key
    /// that contains or is contained in the name.
    #[must_use]
    pub fn lookup(&self, label: &str) -> Option<&NutritionInfo> {
        let name = normalize(label);
        if name.is_empty() {
            return None;
        }
        if let Some(info) = self.entries.get(&name) {
            return Some(info);
        }
        self.entries
            .iter()
            .filter(|(key, _)| name.contains(key.as_str()) || key.contains(name.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, info)| info)
    }

    /// Every food name, sorted
    #[must_use]
    pub fn all_food_names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Whether the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase with underscores as spaces
fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_table_loads() {
        let table = NutritionTable::bundled().unwrap();
        assert!(!table.is_empty());
        let names = table.all_food_names();
        assert!(names.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(names.contains(&"apple pie"));
    }

    #[test]
    fn test_exact_match_with_underscores() {
        let table = NutritionTable::bundled().unwrap();
        let info = table.lookup("Apple_Pie").unwrap();
        assert_eq!(info.calories_per_serving, 411);
        assert_eq!(info.category, "red");
    }

    #[test]
    fn test_substring_match_both_directions() {
        let table = NutritionTable::from_json(
            r#"{
                "soup": {"caloriesPerServing": 100, "servingSize": "1 cup", "category": "green"},
                "tomato soup": {"caloriesPerServing": 161, "servingSize": "1 cup (245g)", "category": "green"},
                "chocolate cake": {"caloriesPerServing": 424, "servingSize": "1 slice", "category": "red"}
            }"#,
        )
        .unwrap();

        // Name contains key; the longest key wins
        assert_eq!(
            table.lookup("creamy_tomato_soup").unwrap().calories_per_serving,
            161
        );
        // Key contains name
        assert_eq!(table.lookup("chocolate").unwrap().calories_per_serving, 424);
        assert!(table.lookup("bibimbap").is_none());
        assert!(table.lookup("  ").is_none());
    }
}
