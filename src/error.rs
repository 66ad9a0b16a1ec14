//! Error types for parlance.
//!
//! All errors are strongly typed using thiserror. Configuration-level
//! problems (`RuleError`) are recovered locally during index rebuilds:
//! the offending rule or input variant is skipped so one bad rule cannot
//! disable the whole engine. A failed match is not an error at all; it is
//! reported as an empty [`Response`](crate::Response).

use thiserror::Error;

use crate::rule::RuleId;

/// Configuration errors localized to a single rule or input variant.
///
/// These are produced while compiling a rule set into the pattern index.
/// They never escape `get_response`; the affected rule simply never matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule carries no input patterns.
    #[error("Rule {rule_id} has no input patterns")]
    EmptyInputs {
        /// The offending rule.
        rule_id: RuleId,
    },

    /// The rule carries no outputs (or only blank ones).
    #[error("Rule {rule_id} has no outputs")]
    EmptyOutputs {
        /// The offending rule.
        rule_id: RuleId,
    },

    /// The rule has more input variants than a match record can identify.
    #[error("Rule {rule_id} has {count} input variants, more than the supported {max}")]
    TooManyInputs {
        /// The offending rule.
        rule_id: RuleId,
        /// How many input variants the rule carries.
        count: usize,
        /// The supported maximum.
        max: usize,
    },

    /// One input variant could not be compiled into a pattern.
    #[error("Rule {rule_id} input {input_index} is not a usable pattern: {reason}")]
    InvalidPattern {
        /// The offending rule.
        rule_id: RuleId,
        /// Position of the unusable pattern in the rule's input list.
        input_index: usize,
        /// Human-readable compilation failure.
        reason: String,
    },
}

/// Top-level error type for parlance.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A rule configuration error surfaced through a fallible API.
    #[error("Rule configuration error: {0}")]
    Rule(#[from] RuleError),

    /// The property name is not recognized.
    #[error("Unknown engine property: {name}")]
    UnknownProperty {
        /// The unrecognized property name.
        name: String,
    },

    /// The property exists but the supplied value has the wrong kind.
    #[error("Property '{name}' expects a {expected} value")]
    InvalidPropertyValue {
        /// The property name.
        name: String,
        /// Description of the expected value kind.
        expected: &'static str,
    },

    /// An invariant the engine relies on was broken.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl EngineError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a rule configuration error.
    #[must_use]
    pub const fn is_rule(&self) -> bool {
        matches!(self, Self::Rule(_))
    }

    /// Returns true if this is a property error.
    #[must_use]
    pub const fn is_property(&self) -> bool {
        matches!(
            self,
            Self::UnknownProperty { .. } | Self::InvalidPropertyValue { .. }
        )
    }
}

/// Result type alias for parlance operations.
pub type EngineResult<T> = Result<T, EngineError>;
