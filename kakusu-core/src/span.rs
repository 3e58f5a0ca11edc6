// kakusu-core/src/span.rs
//! The `Span` value type and character/byte offset bookkeeping.
//!
//! Spans carry *character* offsets because that is what the external recognizer
//! reports. Regex matching and string slicing work on bytes, so [`CharIndex`]
//! converts between the two for a single piece of text.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::category::Category;

/// Provenance of a detected span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Matched by a rule-file pattern.
    Rule,
    /// Reported by the external named-entity recognizer.
    Ner,
    /// A literal value the caller asked to mask.
    Custom,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Rule => "rule",
            Source::Ner => "ner",
            Source::Custom => "custom",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected candidate region of sensitive text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub category: Category,
    /// Inclusive start, in characters.
    pub start: usize,
    /// Exclusive end, in characters.
    pub end: usize,
    pub priority: i32,
    pub source: Source,
}

impl Span {
    pub fn new(
        text: impl Into<String>,
        category: Category,
        start: usize,
        end: usize,
        priority: i32,
        source: Source,
    ) -> Self {
        debug_assert!(start < end, "span must be non-empty: [{}, {})", start, end);
        Self {
            text: text.into(),
            category,
            start,
            end,
            priority,
            source,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when the two half-open ranges share at least one offset.
    pub fn overlaps(&self, other: &Span) -> bool {
        ranges_overlap(self.start, self.end, other.start, other.end)
    }
}

pub fn ranges_overlap(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start < b_end && b_start < a_end
}

/// Maps character offsets of one string to byte offsets and back.
#[derive(Debug)]
pub struct CharIndex {
    /// `bytes[i]` is the byte offset of character `i`; the last entry is `text.len()`.
    bytes: Vec<usize>,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        let mut bytes: Vec<usize> = Vec::with_capacity(text.len() + 1);
        bytes.extend(text.char_indices().map(|(idx, _)| idx));
        bytes.push(text.len());
        Self { bytes }
    }

    /// Number of characters in the indexed text.
    pub fn char_len(&self) -> usize {
        self.bytes.len() - 1
    }

    /// Byte offset of a character offset. Offsets past the end clamp to the end.
    pub fn byte_of(&self, char_offset: usize) -> usize {
        let idx = char_offset.min(self.char_len());
        self.bytes[idx]
    }

    /// Character offset of a byte offset that lies on a char boundary.
    pub fn char_of(&self, byte_offset: usize) -> usize {
        match self.bytes.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => {
                debug_assert!(false, "byte offset {} is not on a char boundary", byte_offset);
                idx.saturating_sub(1)
            }
        }
    }

    /// Slices `text` (the string this index was built from) by character offsets.
    pub fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        &text[self.byte_of(start)..self.byte_of(end)]
    }
}
