// kakusu-core/src/engines/resolver.rs
//! Entity resolution: adjacency merge followed by overlap resolution.
//!
//! The output of [`resolve`] is the exact, non-overlapping, position-ordered
//! sequence the mask applier consumes.
//! License: MIT OR APACHE 2.0

use log::debug;
use std::collections::BTreeMap;

use crate::category::Category;
use crate::config::MergeConfig;
use crate::span::{CharIndex, Span, Source};

/// Runs both passes over the fused candidates.
pub fn resolve(spans: Vec<Span>, text: &str, merge: &MergeConfig) -> Vec<Span> {
    let merged = merge_adjacent(spans, text, merge);
    let resolved = remove_overlaps(merged);
    debug_assert!(
        resolved.windows(2).all(|w| w[0].end <= w[1].start),
        "resolver output must be sorted and disjoint"
    );
    resolved
}

/// True when `gap` may sit between two merged spans.
fn is_connector_gap(gap: &str, merge: &MergeConfig) -> bool {
    let visible = gap.chars().filter(|c| !c.is_whitespace()).count();
    visible <= merge.max_gap_chars
        && gap
            .chars()
            .all(|c| c.is_whitespace() || c == '\u{3000}' || merge.connectors.contains(c))
}

/// Pass 1: joins same-category spans separated only by a short connector gap.
///
/// A merge that involves a rule-sourced span is rule-sourced and takes the
/// stronger priority; otherwise the first span's provenance is kept.
pub fn merge_adjacent(spans: Vec<Span>, text: &str, merge: &MergeConfig) -> Vec<Span> {
    if spans.is_empty() {
        return spans;
    }
    let index = CharIndex::new(text);

    let mut groups: BTreeMap<Category, Vec<Span>> = BTreeMap::new();
    for span in spans {
        groups.entry(span.category.clone()).or_default().push(span);
    }

    let mut merged: Vec<Span> = Vec::new();
    for (category, mut group) in groups {
        group.sort_by_key(|s| s.start);
        let mut iter = group.into_iter();
        let Some(mut current) = iter.next() else {
            continue;
        };

        for next in iter {
            // Overlapping spans have an empty gap and always join.
            let joinable = next.start <= current.end
                || is_connector_gap(index.slice(text, current.end, next.start), merge);
            if !joinable {
                merged.push(current);
                current = next;
                continue;
            }

            debug!(
                "Merging adjacent {} spans [{}, {}) and [{}, {})",
                category, current.start, current.end, next.start, next.end
            );
            let (priority, source) =
                if current.source == Source::Rule || next.source == Source::Rule {
                    (current.priority.min(next.priority), Source::Rule)
                } else {
                    (current.priority, current.source)
                };
            let end = next.end.max(current.end);
            current = Span::new(
                index.slice(text, current.start, end),
                category.clone(),
                current.start,
                end,
                priority,
                source,
            );
        }
        merged.push(current);
    }

    merged.sort_by_key(|s| s.start);
    merged
}

/// Pass 2: keeps a maximal non-overlapping subset.
///
/// Candidates are visited rule-first, then by priority, then longest first, then
/// earliest. A conflicting candidate evicts the accepted spans it overlaps when it
/// is rule-sourced and none of them are, or when its priority is strictly lower
/// than theirs.
pub fn remove_overlaps(spans: Vec<Span>) -> Vec<Span> {
    let mut candidates = spans;
    candidates.sort_by(|a, b| {
        (a.source != Source::Rule, a.priority, std::cmp::Reverse(a.len()), a.start).cmp(&(
            b.source != Source::Rule,
            b.priority,
            std::cmp::Reverse(b.len()),
            b.start,
        ))
    });

    let mut accepted: Vec<Span> = Vec::new();
    for candidate in candidates {
        let conflicts: Vec<usize> = accepted
            .iter()
            .enumerate()
            .filter(|(_, s)| s.overlaps(&candidate))
            .map(|(i, _)| i)
            .collect();

        if conflicts.is_empty() {
            accepted.push(candidate);
            continue;
        }

        let rule_beats_all = candidate.source == Source::Rule
            && conflicts.iter().all(|&i| accepted[i].source != Source::Rule);
        let min_conflict_priority = conflicts
            .iter()
            .map(|&i| accepted[i].priority)
            .min()
            .unwrap_or(i32::MAX);

        if rule_beats_all || candidate.priority < min_conflict_priority {
            debug!(
                "Span [{}, {}) evicts {} overlapping span(s)",
                candidate.start,
                candidate.end,
                conflicts.len()
            );
            for &i in conflicts.iter().rev() {
                accepted.remove(i);
            }
            accepted.push(candidate);
        }
    }

    accepted.sort_by_key(|s| s.start);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, cat: Category, start: usize, end: usize, prio: i32, source: Source) -> Span {
        Span::new(text, cat, start, end, prio, source)
    }

    #[test]
    fn test_merges_names_joined_by_nakaguro() {
        let text = "ジョン・スミス氏";
        let spans = vec![
            span("ジョン", Category::Person, 0, 3, 10, Source::Ner),
            span("スミス", Category::Person, 4, 7, 10, Source::Ner),
        ];
        let merged = merge_adjacent(spans, text, &MergeConfig::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "ジョン・スミス");
        assert_eq!((merged[0].start, merged[0].end), (0, 7));
        assert_eq!(merged[0].source, Source::Ner);
        assert_eq!(merged[0].priority, 10);
    }

    #[test]
    fn test_merge_with_rule_span_becomes_rule_sourced() {
        let text = "営業部 開発部";
        let spans = vec![
            span("営業部", Category::Department, 0, 3, 99, Source::Ner),
            span("開発部", Category::Department, 4, 7, 3, Source::Rule),
        ];
        let merged = merge_adjacent(spans, text, &MergeConfig::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, Source::Rule);
        assert_eq!(merged[0].priority, 3);
    }

    #[test]
    fn test_does_not_merge_across_words_or_categories() {
        let text = "山田と佐藤、東京";
        let spans = vec![
            span("山田", Category::Person, 0, 2, 10, Source::Ner),
            span("佐藤", Category::Person, 3, 5, 10, Source::Ner),
            span("東京", Category::Location, 6, 8, 12, Source::Ner),
        ];
        let merged = merge_adjacent(spans, text, &MergeConfig::default());
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_gap_threshold_is_configurable() {
        let text = "A ・・・ B";
        let spans = vec![
            span("A", Category::Org, 0, 1, 2, Source::Rule),
            span("B", Category::Org, 6, 7, 2, Source::Rule),
        ];
        let strict = merge_adjacent(spans.clone(), text, &MergeConfig::default());
        assert_eq!(strict.len(), 2);

        let loose = MergeConfig {
            max_gap_chars: 3,
            ..MergeConfig::default()
        };
        let merged = merge_adjacent(spans, text, &loose);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "A ・・・ B");
    }

    #[test]
    fn test_rule_span_wins_over_longer_ner_span() {
        let spans = vec![
            span("山田太郎部長", Category::Person, 0, 6, 10, Source::Ner),
            span("部長", Category::Position, 4, 6, 1, Source::Rule),
        ];
        let resolved = remove_overlaps(spans);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].source, Source::Rule);
    }

    #[test]
    fn test_custom_span_evicts_rule_span() {
        let spans = vec![
            span("株式会社Lightblue", Category::Org, 0, 13, 2, Source::Rule),
            span("Lightblue", Category::Custom, 4, 13, -1, Source::Custom),
        ];
        let resolved = remove_overlaps(spans);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].source, Source::Custom);
    }

    #[test]
    fn test_longer_span_wins_at_equal_priority() {
        let spans = vec![
            span("山田", Category::Person, 0, 2, 10, Source::Ner),
            span("山田太郎", Category::Person, 0, 4, 10, Source::Ner),
            span("太郎部長", Category::Position, 2, 6, 10, Source::Ner),
        ];
        let resolved = remove_overlaps(spans);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].text, "山田太郎");
    }

    #[test]
    fn test_resolved_output_never_overlaps() {
        let text = "あいうえおかきくけこさしすせそ";
        let mut spans = Vec::new();
        for start in 0..12 {
            for len in 1..4 {
                let source = if (start + len) % 3 == 0 { Source::Rule } else { Source::Ner };
                let cat = if start % 2 == 0 { Category::Person } else { Category::Org };
                spans.push(span(
                    "x",
                    cat,
                    start,
                    start + len,
                    ((start * 7 + len) % 5) as i32,
                    source,
                ));
            }
        }
        let resolved = resolve(spans, text, &MergeConfig::default());
        for pair in resolved.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
    }
}
