// kakusu-core/src/engines/rule_matcher.rs
//! Rule-sourced span detection.
//!
//! Scans the text with every compiled pattern of the catalog, group by group in
//! catalog order. The first accepted span claims its range: later candidates that
//! overlap it are dropped, as are candidates vetoed by the exclusion set.
//! License: MIT OR APACHE 2.0

use log::debug;

use crate::mapping::log_span_debug;
use crate::sanitizers::compiler::{PatternCatalog, PatternRule};
use crate::span::{ranges_overlap, CharIndex, Span, Source};

/// Finds rule-sourced spans in `text`, sorted by start offset.
pub fn find(text: &str, catalog: &PatternCatalog) -> Vec<Span> {
    let index = CharIndex::new(text);
    let mut accepted: Vec<Span> = Vec::new();

    for group in &catalog.groups {
        for rule in &group.rules {
            for (byte_start, byte_end) in boundary_matches(rule, text) {
                let matched = &text[byte_start..byte_end];
                let start = index.char_of(byte_start);
                let end = index.char_of(byte_end);

                if accepted.iter().any(|s| ranges_overlap(s.start, s.end, start, end)) {
                    continue;
                }
                if catalog.exclusions.is_excluded(matched) {
                    continue;
                }

                log_span_debug("Rule", matched, &rule.category, start, end);
                accepted.push(Span::new(
                    matched,
                    rule.category.clone(),
                    start,
                    end,
                    rule.priority,
                    Source::Rule,
                ));
            }
        }
    }

    accepted.sort_by_key(|s| s.start);
    debug!("Rule matcher accepted {} span(s).", accepted.len());
    accepted
}

/// Byte ranges of capture group 1 for every boundary-satisfying match of `rule`.
///
/// The right boundary is consumed by the regex, so the next search resumes at the
/// end of the group: the boundary character stays available as the left boundary
/// of a following match.
fn boundary_matches(rule: &PatternRule, text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut pos = 0;

    while pos <= text.len() {
        let Some(caps) = rule.regex.captures_at(text, pos) else {
            break;
        };
        let Some(group) = caps.get(1) else {
            break;
        };

        if group.start() == group.end() {
            // Empty matches cannot form a span; step one character forward.
            let next = text[group.end()..]
                .chars()
                .next()
                .map(|c| group.end() + c.len_utf8());
            match next {
                Some(next) => pos = next.max(pos + 1),
                None => break,
            }
            continue;
        }

        out.push((group.start(), group.end()));
        pos = group.end();
    }
    out
}
