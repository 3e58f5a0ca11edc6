// kakusu-core/src/engines/fuser.rs
//! Fusion of rule, recognizer and caller-literal spans into one candidate list.
//!
//! Rule spans always keep the ground they cover: a recognizer span that touches
//! any rule span is discarded here, before resolution. Caller literals are added
//! unconditionally with the most eager priority.

use log::debug;

use crate::category::{Category, CUSTOM_PRIORITY};
use crate::mapping::log_span_debug;
use crate::recognizer::NerSpan;
use crate::span::{CharIndex, Span, Source};

/// Builds `custom` spans for every occurrence of every literal value.
///
/// Occurrences are found by plain, case-sensitive substring search, left to right
/// and non-overlapping per value. Empty values are ignored.
pub fn custom_spans(text: &str, literal_values: &[String]) -> Vec<Span> {
    let index = CharIndex::new(text);
    let mut spans = Vec::new();

    for value in literal_values.iter().filter(|v| !v.is_empty()) {
        for (byte_start, matched) in text.match_indices(value.as_str()) {
            let start = index.char_of(byte_start);
            let end = index.char_of(byte_start + matched.len());
            spans.push(Span::new(
                matched,
                Category::Custom,
                start,
                end,
                CUSTOM_PRIORITY,
                Source::Custom,
            ));
        }
    }
    spans
}

/// Normalizes recognizer output into `ner` spans.
///
/// Labels go through the alias table; spans whose category is not in a
/// non-empty `categories` list are dropped. An empty list filters nothing.
/// Offsets must already be validated against `text`.
pub fn ner_spans(text: &str, raw: &[NerSpan], categories: Option<&[Category]>) -> Vec<Span> {
    let index = CharIndex::new(text);
    let categories = categories.filter(|wanted| !wanted.is_empty());
    raw.iter()
        .filter_map(|ner| {
            let category = Category::from_ner_label(&ner.label);
            if let Some(wanted) = categories {
                if !wanted.contains(&category) {
                    return None;
                }
            }
            let priority = category.ner_priority();
            Some(Span::new(
                index.slice(text, ner.start, ner.end),
                category,
                ner.start,
                ner.end,
                priority,
                Source::Ner,
            ))
        })
        .collect()
}

/// Concatenates the three sources, keeping a recognizer span only when it is
/// disjoint from every rule span.
pub fn fuse(rule_spans: Vec<Span>, ner_spans: Vec<Span>, custom_spans: Vec<Span>) -> Vec<Span> {
    let mut fused = Vec::with_capacity(rule_spans.len() + ner_spans.len() + custom_spans.len());

    let mut dropped = 0usize;
    let kept_ner: Vec<Span> = ner_spans
        .into_iter()
        .filter(|ner| {
            let clashes = rule_spans.iter().any(|rule| rule.overlaps(ner));
            if clashes {
                dropped += 1;
            } else {
                log_span_debug("NER", &ner.text, &ner.category, ner.start, ner.end);
            }
            !clashes
        })
        .collect();

    debug!(
        "Fusing {} rule, {} ner ({} dropped for overlapping rules) and {} custom span(s).",
        rule_spans.len(),
        kept_ner.len(),
        dropped,
        custom_spans.len()
    );

    fused.extend(rule_spans);
    fused.extend(kept_ner);
    fused.extend(custom_spans);
    fused
}
