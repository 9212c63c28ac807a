// ABOUTME: Main library entry point for Platewise multi-provider meal analysis
// ABOUTME: Concurrent cloud and on-device analysis of meal photos with normalized results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Platewise
//!
//! Analyzes a photo of a meal by asking several independent backends at the
//! same time (Claude, `OpenAI`, Gemini and an on-device classifier), normalizing
//! their answers into one canonical shape, and letting the caller choose the
//! best surviving answer.
//!
//! ## Architecture
//!
//! - **`llm`**: one shared request/response pipeline with per-provider
//!   request builders and text extractors
//! - **`on_device`**: local classifier plus nutrition table, no network
//! - **`comparison`**: fan-out/fan-in orchestration with failure isolation
//! - **`selection`**: latency, preference and meal records for an external sink
//! - **`config`**, **`credentials`**, **`logging`**: ambient setup
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use platewise::comparison::Orchestrator;
//! use platewise_core::{AnalysisRequest, AppResult, ProviderId};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let orchestrator = Orchestrator::from_env()?;
//!     let photo = std::fs::read("lunch.jpg")?;
//!
//!     let report = orchestrator.compare_all(&AnalysisRequest::new(photo)).await;
//!     for success in &report.successes {
//!         println!("{}: {}", success.provider, success.result.food_name);
//!     }
//!
//!     let selection = report.select(&[ProviderId::Claude])?;
//!     println!("{} latency samples", selection.latency_samples.len());
//!     Ok(())
//! }
//! ```

/// Fan-out/fan-in comparison across providers
pub mod comparison;

/// Analysis configuration from the environment
pub mod config;

/// Provider credential lookup
pub mod credentials;

/// Upload image preprocessing
pub mod imaging;

/// Cloud provider adapters
pub mod llm;

/// Structured logging setup
pub mod logging;

/// On-device classifier adapter
pub mod on_device;

/// Selection and feedback records
pub mod selection;

pub use comparison::{Analyzer, ComparisonReport, Orchestrator};
pub use platewise_core::{
    AnalysisError, AnalysisRequest, AppError, AppResult, AttemptOutcome, CanonicalResult,
    ProviderId, Rating,
};
