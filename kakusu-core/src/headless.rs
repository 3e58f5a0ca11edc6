// kakusu-core/src/headless.rs
//! `headless.rs`
//! Convenience wrappers for one-shot, non-interactive masking and decoding.
//!
//! These compile (or fetch from the cache) the catalog for a configuration,
//! build an engine around the given recognizer and run a single call.

use anyhow::{Context, Result};

use crate::config::MaskingConfig;
use crate::engine::{MaskOutcome, MaskRequest, MaskingEngine};
use crate::engines::decoder;
use crate::mapping::EntityMapping;
use crate::recognizer::EntityRecognizer;
use crate::sanitizers::compiler::get_or_compile_catalog;

/// Masks `content` in a single call.
///
/// # Arguments
///
/// * `config` - The merged configuration (defaults + optional user rules).
/// * `recognizer` - Source of named-entity spans; `StaticRecognizer::empty()` for rules only.
/// * `content` - The text to mask.
/// * `request` - Category filter, mask style and overrides.
pub fn headless_mask_string(
    config: &MaskingConfig,
    recognizer: Box<dyn EntityRecognizer>,
    content: &str,
    request: &MaskRequest,
) -> Result<MaskOutcome> {
    let catalog = get_or_compile_catalog(config).context("Failed to compile masking rules")?;
    let engine = MaskingEngine::new(catalog, recognizer);
    let outcome = engine
        .mask(content, request)
        .context("Failed to mask input text")?;
    Ok(outcome)
}

/// Restores `masked_text` with `mapping`.
pub fn headless_decode(masked_text: &str, mapping: &EntityMapping) -> String {
    decoder::decode(masked_text, mapping)
}
