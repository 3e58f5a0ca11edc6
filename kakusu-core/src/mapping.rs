// kakusu-core/src/mapping.rs
//! Data structures produced by masking: the reversible entity mapping, the audit
//! trail, and helpers for logging sensitive text safely.

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::category::Category;
use crate::span::Source;

lazy_static! {
    /// Whether original (sensitive) text may appear in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("KAKUSU_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// One reversible substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub original_text: String,
    /// What currently stands in the masked text: the mask string, or an override.
    pub masked_text: String,
    pub category: Category,
    pub source: Source,
}

/// Mask string → entry. Keys never change once assigned, even when an override
/// rewrites an entry's `masked_text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityMapping {
    entries: BTreeMap<String, MappingEntry>,
}

impl EntityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mask: String, entry: MappingEntry) {
        self.entries.insert(mask, entry);
    }

    pub fn get(&self, mask: &str) -> Option<&MappingEntry> {
        self.entries.get(mask)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappingEntry)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.values()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut MappingEntry> {
        self.entries.values_mut()
    }
}

impl FromIterator<(String, MappingEntry)> for EntityMapping {
    fn from_iter<I: IntoIterator<Item = (String, MappingEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Character offsets of an audit record in the preprocessed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

/// Debug trace of one applied mask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub original: String,
    pub category: Category,
    pub mask_token: String,
    pub position: Position,
    pub source: Source,
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    let chars = s.chars().count();
    if chars <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", chars)
    }
}

/// Original text when `KAKUSU_ALLOW_DEBUG_PII=true`, a redacted stand-in otherwise.
pub fn loggable(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub fn log_mask_applied_debug(original: &str, mask: &str, category: &Category, source: Source) {
    debug!(
        "Mask applied: Original='{}', Mask='{}', Category={}, Source={}",
        loggable(original),
        mask,
        category,
        source
    );
}

pub fn log_span_debug(stage: &str, original: &str, category: &Category, start: usize, end: usize) {
    debug!(
        "{} span: '{}' category={} [{}, {})",
        stage,
        loggable(original),
        category,
        start,
        end
    );
}
