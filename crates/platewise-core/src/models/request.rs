// ABOUTME: Immutable analysis request holding the captured photo
// ABOUTME: Image bytes are shared across provider tasks without copying
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One photo to analyze, consumed by a single comparison session
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    image: Arc<[u8]>,
    captured_at: Option<DateTime<Utc>>,
}

impl AnalysisRequest {
    /// Create a request from raw image bytes
    #[must_use]
    pub fn new(image: impl Into<Arc<[u8]>>) -> Self {
        Self {
            image: image.into(),
            captured_at: None,
        }
    }

    /// Attach the capture timestamp (e.g. from photo metadata)
    #[must_use]
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = Some(captured_at);
        self
    }

    /// Raw image bytes
    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Shared handle to the image bytes
    #[must_use]
    pub fn image_shared(&self) -> Arc<[u8]> {
        Arc::clone(&self.image)
    }

    /// Capture timestamp if known
    #[must_use]
    pub const fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }
}
