// ABOUTME: Normalizes a model's free-text answer into the canonical meal result
// ABOUTME: Strips markdown code fences and surrounding prose before JSON decoding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use platewise_core::{AnalysisError, CanonicalResult};
use tracing::debug;

const FENCE: &str = "```";

/// Remove markdown code-fence wrapping and surrounding whitespace.
///
/// Only a fence that opens the answer is treated as wrapping: a fully fenced
/// answer (```` ```json\n{..}\n``` ````), a fence with no language tag, or an
/// unterminated fence. Backticks anywhere else are left alone, so text that
/// does not start with a fence is only trimmed.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with(FENCE) {
        fenced_body(trimmed)
    } else {
        trimmed
    }
}

/// Body of the fenced block `text` starts with
fn fenced_body(text: &str) -> &str {
    let after_open = &text[FENCE.len()..];
    // Language tag runs up to the first whitespace or JSON delimiter
    let tag_len = after_open
        .find(|c: char| c.is_whitespace() || c == '{' || c == '[')
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];

    body.find(FENCE).map_or(body, |close| &body[..close]).trim()
}

/// First fenced block embedded in prose
fn embedded_block(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    Some(fenced_body(&text[open..]))
}

/// Outermost `{ ... }` span, when the answer has prose around the object
fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn decode(text: &str) -> Result<CanonicalResult, serde_json::Error> {
    serde_json::from_str::<CanonicalResult>(text)
}

/// Decode a model answer into a [`CanonicalResult`].
///
/// The fence-stripped answer is tried first, then a fenced block inside
/// prose, then the outermost JSON object of the stripped and of the raw text.
///
/// # Errors
///
/// Returns [`AnalysisError::DecodingError`] when none of these decodes
/// against the canonical schema.
pub fn parse_canonical(text: &str) -> Result<CanonicalResult, AnalysisError> {
    let cleaned = strip_code_fences(text);
    let primary = match decode(cleaned) {
        Ok(result) => return Ok(result),
        Err(e) => e,
    };

    let fallbacks = [
        embedded_block(cleaned),
        object_span(cleaned),
        object_span(text.trim()),
    ];
    for candidate in fallbacks.into_iter().flatten() {
        if candidate == cleaned {
            continue;
        }
        if let Ok(result) = decode(candidate) {
            debug!("Decoded canonical result after discarding surrounding text");
            return Ok(result);
        }
    }
    Err(AnalysisError::DecodingError(primary.to_string()))
}
