//! errors.rs - Custom error types for the kakusu-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that callers (CLI, services) can match on.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// Result alias used throughout the core.
pub type KakusuResult<T> = Result<T, KakusuError>;

/// All error types produced by `kakusu-core`.
///
/// A token that appears in a mapping but not in the text handed to the decoder is
/// deliberately absent here: decoding skips it instead of failing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum KakusuError {
    /// The rule file is missing, unreadable, malformed or lacks a required section.
    #[error("Failed to load masking rules from '{0}': {1}")]
    ConfigError(String, String),

    #[error("Failed to compile pattern for category '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Category '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    /// The external named-entity recognizer could not be reached or failed.
    #[error("Named-entity recognizer unavailable: {0}")]
    DetectionUnavailable(String),

    /// The recognizer returned a span that does not fit the text it was given.
    #[error("Recognizer returned invalid span '{label}' [{start}, {end}) for text of {len} chars")]
    InvalidSpan {
        label: String,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),
}

impl KakusuError {
    /// Shorthand for building a [`KakusuError::ConfigError`].
    pub fn config(source: impl Into<String>, reason: impl ToString) -> Self {
        KakusuError::ConfigError(source.into(), reason.to_string())
    }
}
