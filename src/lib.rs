//! # Parlance - rule-based conversational responses
//!
//! Parlance selects the best-matching operator-authored rule for a piece of
//! free-text input and returns one of that rule's outputs. Rules carry input
//! patterns (with `*` wildcards), rotating outputs, optional partner scoping
//! and optional topic scoping; the engine tracks the current topic per
//! partner and bounds redirect chains so rule authors cannot create infinite
//! response loops.
//!
//! ## Core Concepts
//!
//! - **Rule**: input patterns → candidate outputs, optionally scoped by
//!   partner (`targets`) and conversational `topic`
//! - **Match**: the `(rule id, input index)` record identifying which pattern
//!   variant produced a response
//! - **Redirect**: an output starting with `"=>"` that resubmits its payload
//!   as input, canonicalizing many phrasings onto one rule
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parlance::{ResponseEngine, Rule, RuleId, ANY_TARGET};
//!
//! let engine = ResponseEngine::with_sanitizer(Box::new(parlance::DefaultSanitizer));
//! engine.set_rules(vec![
//!     Rule::new(RuleId::new(1), ["hello", "hi *"], ["Hey!", "Hello there."]),
//! ]);
//!
//! let response = engine.get_response("Hi everyone!", ANY_TARGET);
//! assert_eq!(response.matches.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core model
pub mod error;
pub mod identity;
pub mod rule;
pub mod text;

// Matching pipeline
mod index;
mod matcher;
mod priority;
mod topic;

// Engine surface
pub mod engine;
pub mod rotation;

// Re-export primary types at crate root for convenience
pub use engine::{
    PropertyValue, Response, ResponseEngine, ANY_TARGET, MAX_REDIRECT_DEPTH, PROP_OUTPUT_MODE,
    PROP_PREFER_CURRENT_TOPIC,
};
pub use error::{EngineError, EngineResult, RuleError};
pub use identity::Match;
pub use rotation::OutputMode;
pub use rule::{Rule, RuleId, REDIRECT_PREFIX};
pub use text::{DefaultSanitizer, Lemmatizer, NullLemmatizer, NullSanitizer, Sanitizer};
