// kakusu-core/src/engine.rs
//! The masking engine: one entry point that runs the whole pipeline.
//!
//! `MaskingEngine` owns a shared, compiled [`PatternCatalog`] and a boxed
//! [`EntityRecognizer`]. Each call to [`MaskingEngine::mask`] is independent:
//! spans, tokens and the mapping all live for the duration of the call.
//!
//! Pipeline: preprocess → rule matching → recognizer → fusion → resolution →
//! token assignment and rewrite.
//!
//! License: MIT OR APACHE 2.0

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::category::Category;
use crate::engines::applier::{self, MaskOverrides, MaskStyle};
use crate::engines::{decoder, fuser, resolver, rule_matcher};
use crate::errors::KakusuResult;
use crate::mapping::{AuditRecord, EntityMapping};
use crate::recognizer::{validate_spans, EntityRecognizer};
use crate::sanitizers::compiler::PatternCatalog;

/// Options for one [`MaskingEngine::mask`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRequest {
    /// Recognizer categories to keep; `None` keeps all. Rule and literal spans
    /// are not filtered.
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default)]
    pub style: MaskStyle,
    /// Original text → string that stands in for its mask.
    #[serde(default)]
    pub key_value_overrides: Option<BTreeMap<String, String>>,
    /// Literals that are always masked, and whose masks become fresh UUIDs.
    #[serde(default)]
    pub literal_values: Option<Vec<String>>,
}

/// Result of [`MaskingEngine::mask`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskOutcome {
    pub masked_text: String,
    pub mapping: EntityMapping,
    pub audit: Vec<AuditRecord>,
    /// The text all offsets in `audit` refer to.
    pub preprocessed_text: String,
}

/// Result of [`MaskingEngine::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOutcome {
    pub decoded_text: String,
}

pub struct MaskingEngine {
    catalog: Arc<PatternCatalog>,
    recognizer: Box<dyn EntityRecognizer>,
}

impl MaskingEngine {
    pub fn new(catalog: Arc<PatternCatalog>, recognizer: Box<dyn EntityRecognizer>) -> Self {
        Self { catalog, recognizer }
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Detects and masks every sensitive span of `text`.
    ///
    /// Fails with `DetectionUnavailable` or `InvalidSpan` when the recognizer
    /// does; it never falls back to rules-only masking on its own.
    pub fn mask(&self, text: &str, request: &MaskRequest) -> KakusuResult<MaskOutcome> {
        let preprocessed = self.catalog.preprocessor.apply(text).into_owned();

        let rule_spans = rule_matcher::find(&preprocessed, &self.catalog);

        let raw = self.recognizer.detect_entities(&preprocessed)?;
        validate_spans(&preprocessed, &raw)?;
        let ner_spans = fuser::ner_spans(&preprocessed, &raw, request.categories.as_deref());

        let literal_values = request.literal_values.as_deref().unwrap_or_default();
        let custom_spans = fuser::custom_spans(&preprocessed, literal_values);

        let fused = fuser::fuse(rule_spans, ner_spans, custom_spans);
        let resolved = resolver::resolve(fused, &preprocessed, &self.catalog.merge);

        let applied = applier::apply(
            &preprocessed,
            &resolved,
            request.style,
            &self.catalog.mask_formats,
            MaskOverrides {
                key_values: request.key_value_overrides.as_ref(),
                literal_values: request.literal_values.as_deref(),
            },
        );

        info!(
            "Masked {} span(s) with {} distinct token(s).",
            applied.audit.len(),
            applied.mapping.len()
        );

        Ok(MaskOutcome {
            masked_text: applied.masked_text,
            mapping: applied.mapping,
            audit: applied.audit,
            preprocessed_text: preprocessed,
        })
    }

    /// Restores `masked_text` using `mapping`. Missing masks are skipped.
    pub fn decode(&self, masked_text: &str, mapping: &EntityMapping) -> DecodeOutcome {
        DecodeOutcome {
            decoded_text: decoder::decode(masked_text, mapping),
        }
    }
}
