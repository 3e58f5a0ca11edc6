// kakusu-core/src/engines/decoder.rs
//! Reverses a mask using its mapping.
//!
//! Replacement runs longest mask string first, so a string that contains a
//! shorter one (`A10` around `A1`) is restored before the shorter one can
//! corrupt it. Masks absent from the text are skipped.
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::mapping::{loggable, EntityMapping};

/// Shape of a rendered mask string, used to spot masks no mapping entry covers.
static MASK_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<<[^<>\s]+_[0-9a-f]{8}>>").unwrap_or_else(|e| panic!("invalid built-in mask regex: {}", e))
});

/// Outcome of [`decode_with_report`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeReport {
    pub decoded_text: String,
    /// Mapping entries whose masked text was not found.
    pub unresolved: Vec<String>,
    /// Mask-shaped strings left in the decoded text.
    pub residual_masks: Vec<String>,
}

/// Restores every original the mapping knows about.
pub fn decode(masked_text: &str, mapping: &EntityMapping) -> String {
    decode_with_report(masked_text, mapping).decoded_text
}

/// [`decode`], also reporting what could not be restored.
pub fn decode_with_report(masked_text: &str, mapping: &EntityMapping) -> DecodeReport {
    let mut entries: Vec<_> = mapping.values().collect();
    entries.sort_by(|a, b| {
        b.masked_text
            .chars()
            .count()
            .cmp(&a.masked_text.chars().count())
            .then_with(|| a.masked_text.cmp(&b.masked_text))
    });

    let mut decoded = masked_text.to_string();
    let mut unresolved = Vec::new();
    for entry in entries {
        if entry.masked_text.is_empty() || !decoded.contains(entry.masked_text.as_str()) {
            warn!("Mask '{}' not found in text; skipping.", entry.masked_text);
            unresolved.push(entry.masked_text.clone());
            continue;
        }
        debug!(
            "Restoring '{}' -> '{}'",
            entry.masked_text,
            loggable(&entry.original_text)
        );
        decoded = decoded.replace(entry.masked_text.as_str(), &entry.original_text);
    }

    let residual_masks: Vec<String> = MASK_SHAPE
        .find_iter(&decoded)
        .map(|m| m.as_str().to_string())
        .collect();
    if !residual_masks.is_empty() {
        warn!("{} mask-shaped string(s) remain after decoding.", residual_masks.len());
    }

    DecodeReport {
        decoded_text: decoded,
        unresolved,
        residual_masks,
    }
}
