// kakusu-core/src/preprocess.rs
//! Lossy cleanup applied to input text before any detection runs.
//!
//! Removals such as `本社:` are not reversible. Every span offset, mapping entry
//! and audit record refers to the text *after* this step.

use log::debug;
use regex::Regex;
use std::borrow::Cow;

use crate::config::PreprocessingConfig;
use crate::errors::{KakusuError, KakusuResult};

/// Ordered list of compiled `(pattern, replacement)` rewrites.
#[derive(Debug, Default)]
pub struct Preprocessor {
    rewrites: Vec<(Regex, String)>,
}

impl Preprocessor {
    pub fn compile(config: &PreprocessingConfig) -> KakusuResult<Self> {
        let mut rewrites = Vec::with_capacity(config.remove_patterns.len());
        for removal in &config.remove_patterns {
            let regex = Regex::new(&removal.pattern).map_err(|e| {
                KakusuError::RuleCompilationError("preprocessing.remove_patterns".to_string(), e)
            })?;
            rewrites.push((regex, removal.replacement.clone()));
        }
        Ok(Self { rewrites })
    }

    /// Applies every rewrite in order. Replacements are inserted literally.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(text);
        for (regex, replacement) in &self.rewrites {
            let rewritten = match regex.replace_all(&current, regex::NoExpand(replacement)) {
                Cow::Borrowed(_) => None,
                Cow::Owned(s) => Some(s),
            };
            if let Some(s) = rewritten {
                debug!("Preprocessing pattern '{}' rewrote the input", regex.as_str());
                current = Cow::Owned(s);
            }
        }
        current
    }
}
