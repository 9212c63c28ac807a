// ABOUTME: Analysis prompt sent alongside the meal photo to every cloud provider
// ABOUTME: Loaded at compile time; the runtime value is overridable through configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Analysis Prompt
//!
//! The default instruction asks for a bare JSON object in the canonical
//! schema. Prompts are loaded at compile time from markdown files for easy
//! maintenance.

/// Default meal analysis prompt
pub const MEAL_ANALYSIS_PROMPT: &str = include_str!("meal_analysis.md");

/// Get the default meal analysis prompt
#[must_use]
pub const fn default_analysis_prompt() -> &'static str {
    MEAL_ANALYSIS_PROMPT
}
