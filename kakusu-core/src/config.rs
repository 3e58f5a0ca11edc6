//! Configuration management for `kakusu-core`.
//!
//! This module defines the serde model of the masking rule file: categorized
//! patterns, the exclusion set, per-style mask templates, preprocessing removals
//! and the adjacency-merge heuristic. It handles loading (explicit path, environment,
//! candidate directories, embedded defaults), merging a user file over the defaults
//! and validating the result before anything is compiled.
//!
//! License: MIT OR Apache-2.0

use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::errors::{KakusuError, KakusuResult};

/// Maximum allowed length for a single pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Environment variable naming a rule file to use when none is given explicitly.
pub const RULES_FILE_ENV: &str = "KAKUSU_RULES_FILE";

/// File name searched for in the candidate configuration directories.
pub const RULES_FILE_NAME: &str = "masking_rules.yaml";

/// A single pattern entry: a literal term or an explicit regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSource {
    /// Matched verbatim (regex-escaped before compilation).
    Literal(String),
    /// Compiled as given.
    Regex { regex: String },
}

impl PatternSource {
    /// The pattern as it will be handed to the regex compiler.
    pub fn to_regex_source(&self) -> String {
        match self {
            PatternSource::Literal(term) => regex::escape(term),
            PatternSource::Regex { regex } => regex.clone(),
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            PatternSource::Literal(term) => term,
            PatternSource::Regex { regex } => regex,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitiveTerms {
    pub position_titles: Vec<PatternSource>,
    pub departments: Vec<PatternSource>,
}

/// The `rules` section of the rule file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub company_patterns: Vec<PatternSource>,
    pub email_patterns: Vec<PatternSource>,
    pub phone_patterns: Vec<PatternSource>,
    pub project_patterns: Vec<PatternSource>,
    pub sensitive_terms: SensitiveTerms,
    /// Extra literal terms keyed by category label (e.g. `PERSON`, `COUNTRY`).
    pub custom_entities: BTreeMap<String, Vec<PatternSource>>,
}

impl RuleSet {
    /// Rule groups in catalog order, keyed by group name.
    ///
    /// Built-in groups come first in a fixed order; custom entity labels follow. A
    /// custom label whose lower-case form names a built-in group extends that group.
    pub fn groups(&self) -> Vec<(String, Vec<PatternSource>)> {
        let mut groups: Vec<(String, Vec<PatternSource>)> = vec![
            ("company".to_string(), self.company_patterns.clone()),
            ("email".to_string(), self.email_patterns.clone()),
            ("phone".to_string(), self.phone_patterns.clone()),
            ("project".to_string(), self.project_patterns.clone()),
            ("position".to_string(), self.sensitive_terms.position_titles.clone()),
            ("department".to_string(), self.sensitive_terms.departments.clone()),
        ];

        for (label, terms) in &self.custom_entities {
            let key = label.to_lowercase();
            match groups.iter_mut().find(|(name, _)| *name == key) {
                Some((_, patterns)) => patterns.extend(terms.iter().cloned()),
                None => groups.push((key, terms.clone())),
            }
        }
        groups
    }

    fn pattern_count(&self) -> usize {
        self.groups().iter().map(|(_, p)| p.len()).sum()
    }
}

/// The `exclusions` section: vetoes applied to rule candidates.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Exclusions {
    /// Exact matched texts that are never masked.
    pub common_words: Vec<String>,
    /// Regexes searched in the matched text; any hit vetoes the candidate.
    pub safe_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemovePattern {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl RemovePattern {
    fn new(pattern: &str, replacement: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        }
    }
}

/// Lossy text cleanup applied before detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub remove_patterns: Vec<RemovePattern>,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            remove_patterns: vec![
                RemovePattern::new(r"本社[:：]?\s*", ""),
                RemovePattern::new(r"支社[:：]?\s*", ""),
                RemovePattern::new(r"事務所[:：]?\s*", ""),
                RemovePattern::new(r",\s*本社\s*", ","),
                RemovePattern::new(r"、\s*本社\s*", "、"),
            ],
        }
    }
}

/// Tuning for the adjacency merge of same-category spans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Maximum number of non-whitespace characters allowed between two merged spans.
    pub max_gap_chars: usize,
    /// Characters (besides whitespace) allowed in the gap.
    pub connectors: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_gap_chars: 2,
            connectors: "・".to_string(),
        }
    }
}

/// Style name → category code → template.
pub type MaskFormats = BTreeMap<String, BTreeMap<String, String>>;

/// Top-level structure of a masking rule file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaskingConfig {
    pub rules: RuleSet,
    pub exclusions: Exclusions,
    #[serde(default = "default_mask_formats")]
    pub mask_formats: MaskFormats,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub merge: MergeConfig,
}

impl MaskingConfig {
    /// Loads a rule file (YAML, or JSON which parses as YAML).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KakusuResult<Self> {
        let path = path.as_ref();
        info!("Loading masking rules from: {}", path.display());
        let source = path.display().to_string();
        let text = std::fs::read_to_string(path)
            .map_err(|e| KakusuError::config(&source, format!("cannot read file: {}", e)))?;
        let config = Self::from_yaml_str(&text, &source)?;
        info!(
            "Loaded {} patterns from file {}.",
            config.rules.pattern_count(),
            path.display()
        );
        Ok(config)
    }

    /// Loads the rule set embedded in the library.
    pub fn load_default_rules() -> KakusuResult<Self> {
        debug!("Loading default masking rules from embedded string...");
        let default_yaml = include_str!("../config/default_rules.yaml");
        let config = Self::from_yaml_str(default_yaml, "<embedded default rules>")?;
        debug!("Loaded {} default patterns.", config.rules.pattern_count());
        Ok(config)
    }

    /// Parses and validates a rule file body. `source` is only used in error messages.
    pub fn from_yaml_str(text: &str, source: &str) -> KakusuResult<Self> {
        let config: MaskingConfig =
            serde_yml::from_str(text).map_err(|e| KakusuError::config(source, e))?;
        validate_config(&config).map_err(|e| KakusuError::config(source, e))?;
        Ok(config)
    }

    /// Finds the rule file to use.
    ///
    /// Order: `explicit`, then `$KAKUSU_RULES_FILE`, then the first existing
    /// candidate path, then the embedded defaults. An explicit or environment path
    /// that cannot be read is an error rather than a silent fallback.
    pub fn resolve(explicit: Option<&Path>) -> KakusuResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        if let Ok(env_path) = std::env::var(RULES_FILE_ENV) {
            if !env_path.trim().is_empty() {
                debug!("Using rule file from {}: {}", RULES_FILE_ENV, env_path);
                return Self::load_from_file(env_path);
            }
        }
        match rules_candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from_file(path),
            None => {
                debug!("No rule file found in candidate locations; using embedded defaults.");
                Self::load_default_rules()
            }
        }
    }
}

/// Directories searched for `masking_rules.yaml`, most specific first.
pub fn rules_candidate_paths() -> Vec<PathBuf> {
    let base_dirs = vec![
        dirs::home_dir().map(|p| p.join(".kakusu")),
        dirs::config_dir().map(|p| p.join("kakusu")),
        Some(PathBuf::from(".")),
    ];

    base_dirs
        .into_iter()
        .flatten()
        .map(|dir| dir.join(RULES_FILE_NAME))
        .collect()
}

/// Layers a user rule file over the defaults.
///
/// Pattern lists and exclusions are unioned (user entries appended, duplicates
/// dropped), mask templates are overridden per style and category, and the
/// user's preprocessing and merge sections replace the defaults wholesale.
pub fn merge_rules(default_config: MaskingConfig, user_config: Option<MaskingConfig>) -> MaskingConfig {
    let Some(user) = user_config else {
        debug!("merge_rules called without a user config; keeping defaults.");
        return default_config;
    };
    let mut merged = default_config;

    fn extend_unique<T: PartialEq + Clone>(into: &mut Vec<T>, from: &[T]) {
        for item in from {
            if !into.contains(item) {
                into.push(item.clone());
            }
        }
    }

    let rules = &mut merged.rules;
    extend_unique(&mut rules.company_patterns, &user.rules.company_patterns);
    extend_unique(&mut rules.email_patterns, &user.rules.email_patterns);
    extend_unique(&mut rules.phone_patterns, &user.rules.phone_patterns);
    extend_unique(&mut rules.project_patterns, &user.rules.project_patterns);
    extend_unique(
        &mut rules.sensitive_terms.position_titles,
        &user.rules.sensitive_terms.position_titles,
    );
    extend_unique(
        &mut rules.sensitive_terms.departments,
        &user.rules.sensitive_terms.departments,
    );
    for (label, terms) in &user.rules.custom_entities {
        extend_unique(rules.custom_entities.entry(label.clone()).or_default(), terms);
    }

    extend_unique(&mut merged.exclusions.common_words, &user.exclusions.common_words);
    extend_unique(&mut merged.exclusions.safe_patterns, &user.exclusions.safe_patterns);

    for (style, templates) in user.mask_formats {
        let slot = merged.mask_formats.entry(style).or_default();
        for (category, template) in templates {
            debug!("Overriding mask template for {}", category);
            slot.insert(category, template);
        }
    }

    merged.preprocessing = user.preprocessing;
    merged.merge = user.merge;

    debug!("Final pattern count after merge: {}", merged.rules.pattern_count());
    merged
}

/// The templates used when a rule file has no `mask_formats` section.
pub fn default_mask_formats() -> MaskFormats {
    let descriptive = [
        ("PERSON", "<<人物_{token}>>"),
        ("ORG", "<<組織_{token}>>"),
        ("LOCATION", "<<場所_{token}>>"),
        ("PRODUCT", "<<製品_{token}>>"),
        ("POSITION", "<<役職_{token}>>"),
        ("DATE", "<<日付_{token}>>"),
        ("TIME", "<<時間_{token}>>"),
        ("MONEY", "<<金額_{token}>>"),
        ("EMAIL", "<<メール_{token}>>"),
        ("PHONE", "<<電話番号_{token}>>"),
        ("PROJECT", "<<プロジェクト_{token}>>"),
        ("DEPARTMENT", "<<部署_{token}>>"),
        ("EVENT", "<<イベント_{token}>>"),
        ("COUNTRY", "<<国_{token}>>"),
        ("CUSTOM", "<<カスタム_{token}>>"),
    ];
    let simple = [
        ("PERSON", "<<PERSON_{token}>>"),
        ("ORG", "<<ORG_{token}>>"),
        ("LOCATION", "<<LOC_{token}>>"),
        ("PRODUCT", "<<PROD_{token}>>"),
        ("POSITION", "<<POS_{token}>>"),
        ("DATE", "<<DATE_{token}>>"),
        ("TIME", "<<TIME_{token}>>"),
        ("MONEY", "<<MONEY_{token}>>"),
        ("EMAIL", "<<EMAIL_{token}>>"),
        ("PHONE", "<<PHONE_{token}>>"),
        ("PROJECT", "<<PROJ_{token}>>"),
        ("DEPARTMENT", "<<DEPT_{token}>>"),
        ("EVENT", "<<EVENT_{token}>>"),
        ("COUNTRY", "<<COUNTRY_{token}>>"),
        ("CUSTOM", "<<CUSTOM_{token}>>"),
    ];

    let to_map = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    };

    let mut formats = MaskFormats::new();
    formats.insert("descriptive".to_string(), to_map(&descriptive));
    formats.insert("simple".to_string(), to_map(&simple));
    formats
}

/// Checks pattern integrity before compilation so every problem is reported at once.
fn validate_config(config: &MaskingConfig) -> Result<(), String> {
    let mut errors = Vec::new();

    for (group, patterns) in config.rules.groups() {
        for pattern in &patterns {
            let raw = pattern.raw();
            if raw.trim().is_empty() {
                errors.push(format!("Group '{}' has an empty pattern.", group));
                continue;
            }
            if raw.len() > MAX_PATTERN_LENGTH {
                errors.push(format!(
                    "Group '{}': pattern length ({}) exceeds maximum allowed ({}).",
                    group,
                    raw.len(),
                    MAX_PATTERN_LENGTH
                ));
                continue;
            }
            if let PatternSource::Regex { regex } = pattern {
                if let Err(e) = Regex::new(regex) {
                    errors.push(format!("Group '{}' has an invalid regex pattern: {}", group, e));
                }
            }
        }
    }

    for safe in &config.exclusions.safe_patterns {
        if let Err(e) = Regex::new(safe) {
            errors.push(format!("Invalid safe pattern '{}': {}", safe, e));
        }
    }

    for removal in &config.preprocessing.remove_patterns {
        if let Err(e) = Regex::new(&removal.pattern) {
            errors.push(format!("Invalid preprocessing pattern '{}': {}", removal.pattern, e));
        }
    }

    let mut seen_words = BTreeSet::new();
    for word in &config.exclusions.common_words {
        if !seen_words.insert(word.as_str()) {
            warn!("Duplicate common word in exclusions: '{}'", word);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("Rule validation failed:\n{}", errors.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_entity_with_builtin_name_extends_that_group() {
        let mut rules = RuleSet::default();
        rules.company_patterns = vec![PatternSource::Literal("株式会社A".into())];
        rules
            .custom_entities
            .insert("COMPANY".into(), vec![PatternSource::Literal("B商事".into())]);
        rules
            .custom_entities
            .insert("COUNTRY".into(), vec![PatternSource::Literal("日本".into())]);

        let groups = rules.groups();
        let company = &groups.iter().find(|(n, _)| n == "company").unwrap().1;
        assert_eq!(company.len(), 2);
        assert_eq!(groups.last().unwrap().0, "country");
    }

    #[test]
    fn test_literal_pattern_is_escaped() {
        let literal = PatternSource::Literal("Project-X.v2".into());
        assert_eq!(literal.to_regex_source(), r"Project\-X\.v2");
    }

    #[test]
    fn test_merge_rules_unions_patterns_and_overrides_templates() {
        let defaults = MaskingConfig::load_default_rules().unwrap();
        let user = MaskingConfig::from_yaml_str(
            r#"
rules:
  company_patterns: ["テスト商事"]
exclusions:
  common_words: ["弊社"]
mask_formats:
  simple:
    ORG: "[[ORG {token}]]"
"#,
            "inline",
        )
        .unwrap();
        let merged = merge_rules(defaults.clone(), Some(user));
        assert_eq!(
            merged.rules.company_patterns.len(),
            defaults.rules.company_patterns.len() + 1
        );
        assert_eq!(merged.mask_formats["simple"]["ORG"], "[[ORG {token}]]");
        assert_eq!(
            merged.mask_formats["simple"]["PERSON"],
            defaults.mask_formats["simple"]["PERSON"]
        );
    }
}
