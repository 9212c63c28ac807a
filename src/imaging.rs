// ABOUTME: Image preprocessing shared by every cloud provider before upload
// ABOUTME: Downscales to a bounded longest edge, re-encodes as JPEG, and base64-encodes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Upload Preprocessing
//!
//! Every cloud request carries the same bounded image: the longest edge is
//! scaled down to at most [`ImageOptions::max_edge`] (never up), the aspect
//! ratio is kept, and the result is re-encoded as JPEG. The work is CPU-bound
//! and runs on the blocking pool from within the task that issues the request,
//! so nothing is shared or cached between providers.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use platewise_core::AnalysisError;
use tokio::task;
use tracing::debug;

/// Default longest edge after downscaling
pub const DEFAULT_MAX_EDGE: u32 = 1024;

/// Default JPEG quality (0-100)
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Preprocessing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Maximum length of the longest edge, in pixels
    pub max_edge: u32,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_MAX_EDGE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// A JPEG ready to be embedded in a provider request
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Encoded JPEG bytes
    pub jpeg: Vec<u8>,
    /// Width after scaling
    pub width: u32,
    /// Height after scaling
    pub height: u32,
}

impl PreparedImage {
    /// Standard base64 of the JPEG bytes
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }

    /// MIME type of the encoded payload
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Scale factor `min(max_edge / max(width, height), 1.0)`
#[must_use]
pub fn scale_factor(width: u32, height: u32, max_edge: u32) -> f64 {
    let longest = width.max(height);
    if longest == 0 {
        return 1.0;
    }
    (f64::from(max_edge) / f64::from(longest)).min(1.0)
}

/// Output dimensions after applying [`scale_factor`], rounded, never zero
#[must_use]
pub fn target_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let scale = scale_factor(width, height, max_edge);
    let scaled = |edge: u32| ((f64::from(edge) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Decode, downscale and re-encode an image synchronously.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidImage`] if the bytes are not a decodable
/// image or the JPEG encoder fails.
pub fn prepare(bytes: &[u8], options: ImageOptions) -> Result<PreparedImage, AnalysisError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::InvalidImage(e.to_string()))?;
    let (width, height) = decoded.dimensions();
    let (target_width, target_height) = target_dimensions(width, height, options.max_edge);

    let resized = if (target_width, target_height) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_width, target_height, FilterType::Triangle)
    };

    // JPEG has no alpha channel
    let rgb = resized.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, options.jpeg_quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| AnalysisError::InvalidImage(e.to_string()))?;

    debug!(
        source_width = width,
        source_height = height,
        width = target_width,
        height = target_height,
        bytes = jpeg.len(),
        "Prepared image for upload"
    );

    Ok(PreparedImage {
        jpeg,
        width: target_width,
        height: target_height,
    })
}

/// Run [`prepare`] on the blocking pool and wait for it.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidImage`] from [`prepare`], or
/// [`AnalysisError::TaskFailed`] if the blocking task panicked.
pub async fn prepare_for_upload(
    bytes: Arc<[u8]>,
    options: ImageOptions,
) -> Result<PreparedImage, AnalysisError> {
    task::spawn_blocking(move || prepare(&bytes, options))
        .await
        .map_err(|e| AnalysisError::TaskFailed(format!("image preprocessing: {e}")))?
}
