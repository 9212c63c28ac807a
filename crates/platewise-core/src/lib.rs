// ABOUTME: Core types for the platewise meal analysis platform
// ABOUTME: Foundation crate with the canonical result schema, provider identities, and errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Platewise Core
//!
//! Foundation crate providing the shared types every analysis backend speaks.
//! This crate is designed to change infrequently, enabling incremental
//! compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: `AppError`/`ErrorCode` for application failures and
//!   `AnalysisError`, the per-attempt failure taxonomy
//! - **models**: canonical meal-analysis result, provider identities,
//!   attempt outcomes and the feedback records handed to external sinks

/// Unified error handling with `AppError`, `ErrorCode`, and `AnalysisError`
pub mod errors;

/// Canonical schema, provider identities, outcomes, and feedback records
pub mod models;

pub use errors::{AnalysisError, AppError, AppResult, ErrorCode};
pub use models::{
    AnalysisRequest, AttemptOutcome, AuthStyle, CanonicalResult, LatencySample, MealDraft,
    PreferenceEvent, ProviderDescriptor, ProviderFailure, ProviderId, ProviderSuccess, Rating,
};
