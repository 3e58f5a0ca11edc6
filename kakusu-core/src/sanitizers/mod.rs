//! Rule compilation for the masking engine.
//!
//! This module turns a `MaskingConfig` into a `PatternCatalog`: boundary-anchored,
//! case-insensitive regular expressions grouped by category, the compiled
//! exclusion set and the preprocessing rewrites. It works closely with `config`
//! (rule definitions) and `engines::rule_matcher` (which scans with the result).

pub mod compiler;
