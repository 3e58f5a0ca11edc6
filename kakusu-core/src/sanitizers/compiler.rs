//! compiler.rs - Compiles masking rules into a shareable `PatternCatalog`.
//!
//! This module turns a `MaskingConfig` into boundary-anchored, case-insensitive
//! matchers grouped by category, plus the compiled exclusion set. Compilation is
//! the expensive step, so catalogs are kept in a global cache keyed by a hash of
//! the configuration and handed out as `Arc`s.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::debug;
use regex::{Regex, RegexBuilder};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use crate::category::Category;
use crate::config::{MaskFormats, MaskingConfig, MergeConfig, PatternSource, MAX_PATTERN_LENGTH};
use crate::errors::{KakusuError, KakusuResult};
use crate::preprocess::Preprocessor;

/// Characters that may precede a rule match (besides start of text).
const LEFT_BOUNDARY: &str = r"(?:^|[\s\u{3000}]|[、。，,：:）」』】］｝)\.（「『【［｛(])";

/// Characters that may follow a rule match (besides end of text).
const RIGHT_BOUNDARY: &str = r"(?:[\s\u{3000}]|[、。，,：:（「『【［｛(\.）」』】］｝)！？!?]|$)";

/// A single compiled rule pattern.
///
/// The regex wraps the source pattern as `LEFT (pattern) RIGHT`; capture group 1
/// is the part that becomes a span.
#[derive(Debug)]
pub struct PatternRule {
    pub category: Category,
    pub regex: Regex,
    pub priority: i32,
    /// The pattern as written in the rule file, for logging.
    pub source: String,
}

/// All compiled patterns of one rule group, in file order.
#[derive(Debug)]
pub struct CategoryRules {
    /// Group key from the rule file (`company`, `position`, a custom label, ...).
    pub group: String,
    pub category: Category,
    pub priority: i32,
    pub rules: Vec<PatternRule>,
}

/// Vetoes applied to a rule candidate's matched text.
#[derive(Debug, Default)]
pub struct ExclusionSet {
    pub common_words: HashSet<String>,
    pub safe_patterns: Vec<Regex>,
}

impl ExclusionSet {
    /// True when the matched text is a common word or matches a safe pattern.
    pub fn is_excluded(&self, text: &str) -> bool {
        if self.common_words.contains(text) {
            debug!("Candidate vetoed as common word ({} chars)", text.chars().count());
            return true;
        }
        if let Some(pattern) = self.safe_patterns.iter().find(|p| p.is_match(text)) {
            debug!("Candidate vetoed by safe pattern '{}'", pattern.as_str());
            return true;
        }
        false
    }
}

/// The compiled, read-only form of a rule file.
#[derive(Debug)]
pub struct PatternCatalog {
    /// Rule groups in scan order.
    pub groups: Vec<CategoryRules>,
    pub exclusions: ExclusionSet,
    pub mask_formats: MaskFormats,
    pub preprocessor: Preprocessor,
    pub merge: MergeConfig,
}

impl PatternCatalog {
    /// Compiles a configuration. Fails with the first-class `ConfigError` family
    /// when any pattern is too long or does not compile.
    pub fn load(config: &MaskingConfig) -> KakusuResult<Self> {
        compile_catalog(config)
    }

    /// Total number of compiled patterns across all groups.
    pub fn pattern_count(&self) -> usize {
        self.groups.iter().map(|g| g.rules.len()).sum()
    }

    /// Compiled patterns for a category, with the category's priority.
    pub fn rules_for(&self, category: &Category) -> Vec<&PatternRule> {
        self.groups
            .iter()
            .filter(|g| &g.category == category)
            .flat_map(|g| g.rules.iter())
            .collect()
    }
}

lazy_static! {
    /// A thread-safe, global cache for compiled catalogs.
    /// The key is a hash of the `MaskingConfig`.
    static ref CATALOG_CACHE: RwLock<HashMap<u64, Arc<PatternCatalog>>> = RwLock::new(HashMap::new());
}

fn hash_config(config: &MaskingConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.hash(&mut hasher);
    hasher.finish()
}

/// Builds the boundary-anchored regex for one source pattern.
fn compile_pattern(group: &str, pattern: &PatternSource) -> KakusuResult<Regex> {
    let raw = pattern.raw();
    if raw.len() > MAX_PATTERN_LENGTH {
        return Err(KakusuError::PatternLengthExceeded(
            group.to_string(),
            raw.len(),
            MAX_PATTERN_LENGTH,
        ));
    }
    let anchored = format!("{}({}){}", LEFT_BOUNDARY, pattern.to_regex_source(), RIGHT_BOUNDARY);
    RegexBuilder::new(&anchored)
        .case_insensitive(true)
        .unicode(true)
        .size_limit(10 * (1 << 20)) // 10 MB limit for compiled regex
        .build()
        .map_err(|e| KakusuError::RuleCompilationError(group.to_string(), e))
}

/// Compiles every group, safe pattern and preprocessing rule of `config`.
///
/// All pattern errors are collected and reported together.
pub fn compile_catalog(config: &MaskingConfig) -> KakusuResult<PatternCatalog> {
    let groups_src = config.rules.groups();
    debug!("Starting compilation of {} rule groups.", groups_src.len());

    let mut groups = Vec::with_capacity(groups_src.len());
    let mut compilation_errors = Vec::new();

    for (group, patterns) in groups_src {
        let category = Category::from_rule_group(&group);
        let priority = category.rule_priority();
        let mut rules = Vec::with_capacity(patterns.len());

        for pattern in &patterns {
            match compile_pattern(&group, pattern) {
                Ok(regex) => {
                    log::debug!(
                        target: "kakusu_core::compiler",
                        "Group '{}' pattern '{}' compiled successfully.",
                        group,
                        pattern.raw()
                    );
                    rules.push(PatternRule {
                        category: category.clone(),
                        regex,
                        priority,
                        source: pattern.raw().to_string(),
                    });
                }
                Err(e) => compilation_errors.push(e),
            }
        }

        groups.push(CategoryRules {
            group,
            category,
            priority,
            rules,
        });
    }

    let mut safe_patterns = Vec::with_capacity(config.exclusions.safe_patterns.len());
    for safe in &config.exclusions.safe_patterns {
        match RegexBuilder::new(safe).case_insensitive(true).build() {
            Ok(regex) => safe_patterns.push(regex),
            Err(e) => compilation_errors.push(KakusuError::RuleCompilationError(
                "exclusions.safe_patterns".to_string(),
                e,
            )),
        }
    }

    if !compilation_errors.is_empty() {
        let error_message = compilation_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        return Err(KakusuError::config(
            "<pattern compilation>",
            format!(
                "Failed to compile {} pattern(s):\n{}",
                compilation_errors.len(),
                error_message
            ),
        ));
    }

    let preprocessor = Preprocessor::compile(&config.preprocessing)?;

    let catalog = PatternCatalog {
        groups,
        exclusions: ExclusionSet {
            common_words: config.exclusions.common_words.iter().cloned().collect(),
            safe_patterns,
        },
        mask_formats: config.mask_formats.clone(),
        preprocessor,
        merge: config.merge.clone(),
    };
    debug!(
        "Finished compiling catalog. Total patterns: {}.",
        catalog.pattern_count()
    );
    Ok(catalog)
}

/// Gets a catalog from the process-wide cache or compiles and caches it.
///
/// This is the entry point services should use: the returned `Arc` is cheap to
/// clone into every request.
pub fn get_or_compile_catalog(config: &MaskingConfig) -> KakusuResult<Arc<PatternCatalog>> {
    let cache_key = hash_config(config);

    {
        let cache = CATALOG_CACHE.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(catalog) = cache.get(&cache_key) {
            debug!("Serving compiled catalog from cache for key: {}", cache_key);
            return Ok(Arc::clone(catalog));
        }
    }

    debug!("Compiled catalog not found in cache. Compiling now.");
    let compiled = Arc::new(compile_catalog(config)?);

    let mut cache = CATALOG_CACHE.write().unwrap_or_else(PoisonError::into_inner);
    let entry = cache.entry(cache_key).or_insert_with(|| Arc::clone(&compiled));
    debug!("Catalog cached for key: {}", cache_key);
    Ok(Arc::clone(entry))
}
