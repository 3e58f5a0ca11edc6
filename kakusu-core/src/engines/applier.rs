// kakusu-core/src/engines/applier.rs
//! Mask token assignment and text rewriting.
//!
//! Walks the resolved spans left to right and builds a new buffer with every span
//! replaced by its rendered mask string. One token is assigned per distinct
//! original text within a call, so a name that occurs three times is masked
//! three times with the same string and appears once in the mapping.
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tinytemplate::TinyTemplate;
use uuid::Uuid;

use crate::category::Category;
use crate::config::MaskFormats;
use crate::mapping::{log_mask_applied_debug, loggable, AuditRecord, EntityMapping, MappingEntry, Position};
use crate::span::{CharIndex, Span};

/// Length of a generated mask token, in hex characters.
pub const TOKEN_LEN: usize = 8;

/// Template used when a style or category has no usable template.
pub const FALLBACK_TEMPLATE: &str = "<<UNKNOWN_{token}>>";

/// Which family of templates renders the mask strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStyle {
    /// Localized category names, e.g. `<<人物_1a2b3c4d>>`.
    #[default]
    Descriptive,
    /// Category codes, e.g. `<<PERSON_1a2b3c4d>>`.
    Simple,
}

impl MaskStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskStyle::Descriptive => "descriptive",
            MaskStyle::Simple => "simple",
        }
    }
}

impl fmt::Display for MaskStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaskStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "descriptive" => Ok(MaskStyle::Descriptive),
            "simple" => Ok(MaskStyle::Simple),
            other => Err(format!("unknown mask style '{}' (expected 'descriptive' or 'simple')", other)),
        }
    }
}

/// Caller-supplied post-processing of an applied mask.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskOverrides<'a> {
    /// Original text → replacement for its mask string.
    pub key_values: Option<&'a BTreeMap<String, String>>,
    /// Original texts whose mask strings are replaced by fresh UUIDs.
    pub literal_values: Option<&'a [String]>,
}

/// Result of [`apply`].
#[derive(Debug, Clone)]
pub struct AppliedMask {
    pub masked_text: String,
    pub mapping: EntityMapping,
    pub audit: Vec<AuditRecord>,
}

/// A fresh token: the first eight hex digits of a random v4 UUID.
pub fn generate_mask_token() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(TOKEN_LEN);
    token
}

/// Renders `template` with `token`.
///
/// Accepts `{token}` and the legacy `{0}` / `{}` placeholders. Returns `None` for
/// malformed templates and for templates that would not embed the token.
pub fn render_mask(template: &str, token: &str) -> Option<String> {
    let normalized = template.replace("{0}", "{token}").replace("{}", "{token}");
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("mask", &normalized).ok()?;
    let rendered = tt
        .render("mask", &serde_json::json!({ "token": token }))
        .ok()?;
    rendered.contains(token).then_some(rendered)
}

/// Looks up and renders the template for `style` / `category`, degrading to
/// [`FALLBACK_TEMPLATE`] when anything is missing or malformed.
pub fn mask_for(formats: &MaskFormats, style: MaskStyle, category: &Category, token: &str) -> String {
    let rendered = formats
        .get(style.as_str())
        .and_then(|by_category| by_category.get(category.as_str()))
        .and_then(|template| {
            let rendered = render_mask(template, token);
            if rendered.is_none() {
                warn!(
                    "Mask template '{}' for {} / {} is malformed; using fallback.",
                    template, style, category
                );
            }
            rendered
        });

    match rendered {
        Some(mask) => mask,
        None => FALLBACK_TEMPLATE.replace("{token}", token),
    }
}

/// Masks `spans` (resolved: sorted and disjoint) in `text`.
pub fn apply(
    text: &str,
    spans: &[Span],
    style: MaskStyle,
    formats: &MaskFormats,
    overrides: MaskOverrides<'_>,
) -> AppliedMask {
    apply_with_tokens(text, spans, style, formats, overrides, generate_mask_token)
}

/// [`apply`] with an explicit token source.
///
/// A token already used in this call, or one that occurs in `text`, is discarded
/// and drawn again.
pub fn apply_with_tokens<F>(
    text: &str,
    spans: &[Span],
    style: MaskStyle,
    formats: &MaskFormats,
    overrides: MaskOverrides<'_>,
    mut next_token: F,
) -> AppliedMask
where
    F: FnMut() -> String,
{
    let index = CharIndex::new(text);
    let mut text_to_token: HashMap<&str, String> = HashMap::new();
    let mut used_tokens: HashSet<String> = HashSet::new();

    let mut mapping = EntityMapping::new();
    let mut audit = Vec::with_capacity(spans.len());
    let mut masks = Vec::with_capacity(spans.len());

    for span in spans {
        let token = text_to_token
            .entry(span.text.as_str())
            .or_insert_with(|| loop {
                let candidate = next_token();
                if !used_tokens.contains(&candidate) && !text.contains(candidate.as_str()) {
                    used_tokens.insert(candidate.clone());
                    break candidate;
                }
                debug!("Discarding colliding mask token '{}'", candidate);
            })
            .clone();

        let mask = mask_for(formats, style, &span.category, &token);
        log_mask_applied_debug(&span.text, &mask, &span.category, span.source);

        mapping.insert(
            mask.clone(),
            MappingEntry {
                original_text: span.text.clone(),
                masked_text: mask.clone(),
                category: span.category.clone(),
                source: span.source,
            },
        );
        audit.push(AuditRecord {
            original: span.text.clone(),
            category: span.category.clone(),
            mask_token: mask.clone(),
            position: Position {
                start: span.start,
                end: span.end,
            },
            source: span.source,
        });
        masks.push(mask);
    }

    // Rewrite: copy the gap before each span, then its mask.
    let (mut masked_text, tail) = spans.iter().zip(&masks).fold(
        (String::with_capacity(text.len()), 0usize),
        |(mut out, last_byte), (span, mask)| {
            let byte_start = index.byte_of(span.start);
            let byte_end = index.byte_of(span.end);
            debug_assert!(byte_start >= last_byte, "spans must be sorted and disjoint");
            debug_assert!(byte_start < byte_end, "span must be non-empty");
            out.push_str(&text[last_byte..byte_start]);
            out.push_str(mask);
            (out, byte_end)
        },
    );
    masked_text.push_str(&text[tail..]);

    if let Some(key_values) = overrides.key_values {
        for entry in mapping.values_mut() {
            if let Some(replacement) = key_values.get(&entry.original_text) {
                if replacement_is_ambiguous(&masked_text, replacement) {
                    warn!(
                        "Override '{}' already occurs in the text; decoding will also rewrite those occurrences.",
                        replacement
                    );
                }
                masked_text = masked_text.replace(&entry.masked_text, replacement);
                debug!(
                    "Key-value override applied: '{}' -> '{}'",
                    loggable(&entry.original_text),
                    replacement
                );
                entry.masked_text = replacement.clone();
            }
        }
    }

    if let Some(literal_values) = overrides.literal_values {
        for entry in mapping.values_mut() {
            if literal_values.contains(&entry.original_text) {
                let replacement = Uuid::new_v4().to_string();
                masked_text = masked_text.replace(&entry.masked_text, &replacement);
                debug!(
                    "UUID override applied: '{}' -> '{}'",
                    loggable(&entry.original_text),
                    replacement
                );
                entry.masked_text = replacement;
            }
        }
    }

    AppliedMask {
        masked_text,
        mapping,
        audit,
    }
}

/// True when a key-value replacement already appears in the masked text.
fn replacement_is_ambiguous(masked_text: &str, replacement: &str) -> bool {
    !replacement.is_empty() && masked_text.contains(replacement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_mask_formats;
    use crate::span::Source;

    fn span(text: &str, cat: Category, start: usize, end: usize) -> Span {
        Span::new(text, cat, start, end, 1, Source::Rule)
    }

    fn counter_tokens() -> impl FnMut() -> String {
        let mut n = 0u32;
        move || {
            n += 1;
            format!("{:08x}", n)
        }
    }

    #[test]
    fn test_generated_token_is_eight_hex_chars() {
        let token = generate_mask_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_repeated_text_reuses_one_token() {
        let text = "山田と山田";
        let spans = vec![
            span("山田", Category::Person, 0, 2),
            span("山田", Category::Person, 3, 5),
        ];
        let applied = apply_with_tokens(
            text,
            &spans,
            MaskStyle::Simple,
            &default_mask_formats(),
            MaskOverrides::default(),
            counter_tokens(),
        );
        assert_eq!(applied.masked_text, "<<PERSON_00000001>>と<<PERSON_00000001>>");
        assert_eq!(applied.mapping.len(), 1);
        assert_eq!(applied.audit.len(), 2);
        assert_eq!(applied.audit[1].position, Position { start: 3, end: 5 });
    }

    #[test]
    fn test_colliding_tokens_are_redrawn() {
        // The first draw occurs in the input, the second repeats the first.
        let mut draws = vec!["00000001", "abcdef12", "abcdef12", "0badf00d"].into_iter();
        let text = "id 00000001: 佐藤 鈴木";
        let spans = vec![
            span("佐藤", Category::Person, 13, 15),
            span("鈴木", Category::Person, 16, 18),
        ];
        let applied = apply_with_tokens(
            text,
            &spans,
            MaskStyle::Simple,
            &default_mask_formats(),
            MaskOverrides::default(),
            move || draws.next().unwrap().to_string(),
        );
        assert_eq!(
            applied.masked_text,
            "id 00000001: <<PERSON_abcdef12>> <<PERSON_0badf00d>>"
        );
    }

    #[test]
    fn test_missing_template_falls_back_to_unknown() {
        let text = "計画A";
        let spans = vec![span("計画A", Category::Other("PLAN".into()), 0, 3)];
        let applied = apply_with_tokens(
            text,
            &spans,
            MaskStyle::Descriptive,
            &default_mask_formats(),
            MaskOverrides::default(),
            counter_tokens(),
        );
        assert_eq!(applied.masked_text, "<<UNKNOWN_00000001>>");
    }

    #[test]
    fn test_malformed_or_tokenless_template_falls_back() {
        let mut formats = MaskFormats::new();
        let mut simple = BTreeMap::new();
        simple.insert("ORG".to_string(), "<<ORG_{token".to_string());
        simple.insert("PERSON".to_string(), "PERSON".to_string());
        formats.insert("simple".to_string(), simple);

        assert_eq!(
            mask_for(&formats, MaskStyle::Simple, &Category::Org, "deadbeef"),
            "<<UNKNOWN_deadbeef>>"
        );
        assert_eq!(
            mask_for(&formats, MaskStyle::Simple, &Category::Person, "deadbeef"),
            "<<UNKNOWN_deadbeef>>"
        );
        assert_eq!(
            mask_for(&formats, MaskStyle::Descriptive, &Category::Person, "deadbeef"),
            "<<UNKNOWN_deadbeef>>"
        );
    }

    #[test]
    fn test_legacy_placeholders_render() {
        assert_eq!(render_mask("人物_{0}", "12345678").as_deref(), Some("人物_12345678"));
        assert_eq!(render_mask("<<P_{}>>", "12345678").as_deref(), Some("<<P_12345678>>"));
    }

    #[test]
    fn test_key_value_override_rewrites_text_and_mapping() {
        let text = "株式会社Lightblueの件";
        let spans = vec![span("株式会社Lightblue", Category::Org, 0, 13)];
        let mut kv = BTreeMap::new();
        kv.insert("株式会社Lightblue".to_string(), "lead tech".to_string());

        let applied = apply_with_tokens(
            text,
            &spans,
            MaskStyle::Descriptive,
            &default_mask_formats(),
            MaskOverrides {
                key_values: Some(&kv),
                literal_values: None,
            },
            counter_tokens(),
        );
        assert_eq!(applied.masked_text, "lead techの件");
        let entry = applied.mapping.get("<<組織_00000001>>").unwrap();
        assert_eq!(entry.masked_text, "lead tech");
        assert_eq!(entry.original_text, "株式会社Lightblue");
    }

    #[test]
    fn test_key_value_override_already_in_text_is_flagged() {
        let text = "lead tech と 株式会社Lightblue";
        let spans = vec![span("株式会社Lightblue", Category::Org, 12, 25)];
        let mut kv = BTreeMap::new();
        kv.insert("株式会社Lightblue".to_string(), "lead tech".to_string());

        assert!(replacement_is_ambiguous("lead tech と <<組織_00000001>>", "lead tech"));
        assert!(!replacement_is_ambiguous("<<組織_00000001>>の件", "lead tech"));
        assert!(!replacement_is_ambiguous("anything", ""));

        let applied = apply_with_tokens(
            text,
            &spans,
            MaskStyle::Descriptive,
            &default_mask_formats(),
            MaskOverrides {
                key_values: Some(&kv),
                literal_values: None,
            },
            counter_tokens(),
        );
        // The override is still applied; the warning is the caller's signal.
        assert_eq!(applied.masked_text, "lead tech と lead tech");
        assert_eq!(applied.mapping.len(), 1);
    }

    #[test]
    fn test_literal_override_uses_fresh_uuid() {
        let text = "最先端アルゴリズムを採用";
        let spans = vec![Span::new("最先端アルゴリズム", Category::Custom, 0, 9, -1, Source::Custom)];
        let values = vec!["最先端アルゴリズム".to_string()];

        let applied = apply_with_tokens(
            text,
            &spans,
            MaskStyle::Descriptive,
            &default_mask_formats(),
            MaskOverrides {
                key_values: None,
                literal_values: Some(&values),
            },
            counter_tokens(),
        );
        let entry = applied.mapping.values().next().unwrap();
        assert!(Uuid::parse_str(&entry.masked_text).is_ok());
        assert_eq!(applied.masked_text, format!("{}を採用", entry.masked_text));
        assert!(!applied.masked_text.contains("00000001"));
    }
}
