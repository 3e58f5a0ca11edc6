// kakusu-core/src/engines/mod.rs
//! The stages of the masking pipeline, in the order the engine runs them.
//!
//! * `rule_matcher`: catalog patterns → rule spans.
//! * `fuser`: rule, recognizer and caller-literal spans → one candidate list.
//! * `resolver`: adjacency merge, then overlap removal.
//! * `applier`: tokens, templates and the rewritten text.
//! * `decoder`: the inverse of `applier`.
//!
//! # License
//! MIT OR APACHE 2.0

pub mod applier;
pub mod decoder;
pub mod fuser;
pub mod resolver;
pub mod rule_matcher;
