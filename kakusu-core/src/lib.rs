// kakusu-core/src/lib.rs
//! # Kakusu Core Library
//!
//! `kakusu-core` finds sensitive entities in Japanese business text, replaces each
//! one with a short random mask token, and records a mapping that restores the
//! original text exactly.
//!
//! Detection combines two sources. Compiled rule patterns (companies, e-mail
//! addresses, phone numbers, project names, position titles, departments and
//! user-defined entity lists) win every conflict they take part in. Spans from an
//! external named-entity recognizer fill in the rest.
//!
//! ## Modules
//!
//! * `category`: the canonical category enum and its alias and priority tables.
//! * `config`: the YAML rule file, its resolution order and merging.
//! * `sanitizers`: compilation of a configuration into a shared `PatternCatalog`.
//! * `preprocess`: regex rewrites applied before detection.
//! * `recognizer`: the `EntityRecognizer` trait and its static and HTTP adapters.
//! * `engines`: the pipeline stages (rule matching, fusion, resolution, masking, decoding).
//! * `engine`: the `MaskingEngine` facade.
//! * `mapping`: the reversible mapping, audit records and PII-safe logging helpers.
//! * `headless`: one-shot wrappers.
//!
//! ## Usage Example
//!
//! ```rust
//! use kakusu_core::{headless_mask_string, headless_decode, MaskingConfig, MaskRequest, StaticRecognizer};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let config = MaskingConfig::load_default_rules()?;
//!     let text = "代表取締役 田中一郎氏は、Project-X の成功を報告しました。";
//!
//!     let outcome = headless_mask_string(
//!         &config,
//!         Box::new(StaticRecognizer::empty()),
//!         text,
//!         &MaskRequest::default(),
//!     )?;
//!     assert!(!outcome.masked_text.contains("Project-X"));
//!     assert_eq!(headless_decode(&outcome.masked_text, &outcome.mapping), text);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible core operations return [`KakusuResult`] with a [`KakusuError`]. The
//! headless helpers wrap those in `anyhow::Error` with context.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod category;
pub mod config;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod headless;
pub mod mapping;
pub mod preprocess;
pub mod recognizer;
pub mod sanitizers;
pub mod span;

pub use category::Category;

pub use config::{
    merge_rules,
    rules_candidate_paths,
    MaskFormats,
    MaskingConfig,
    MergeConfig,
    PatternSource,
    PreprocessingConfig,
    MAX_PATTERN_LENGTH,
    RULES_FILE_ENV,
};

pub use errors::{KakusuError, KakusuResult};

pub use engine::{DecodeOutcome, MaskOutcome, MaskRequest, MaskingEngine};

pub use engines::applier::MaskStyle;
pub use engines::decoder::{decode, decode_with_report, DecodeReport};

pub use mapping::{redact_sensitive, AuditRecord, EntityMapping, MappingEntry, Position};

pub use recognizer::{validate_spans, EntityRecognizer, HttpRecognizer, NerSpan, StaticRecognizer};

pub use span::{Source, Span};

pub use headless::{headless_decode, headless_mask_string};

pub use sanitizers::compiler::{compile_catalog, get_or_compile_catalog, PatternCatalog};
