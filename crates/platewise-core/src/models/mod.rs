// ABOUTME: Core data models for meal analysis
// ABOUTME: Canonical result, provider identities, attempt outcomes, and feedback records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

mod feedback;
mod outcome;
mod provider;
mod request;
mod result;

pub use feedback::{LatencySample, MealDraft, PreferenceEvent};
pub use outcome::{AttemptOutcome, ProviderFailure, ProviderSuccess};
pub use provider::{AuthStyle, ProviderDescriptor, ProviderId};
pub use request::AnalysisRequest;
pub use result::{CanonicalResult, Rating};
