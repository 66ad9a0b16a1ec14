//! Rule model.
//!
//! A rule maps an ordered list of input patterns to an ordered list of
//! candidate outputs, optionally scoped to a set of conversation partners
//! and to a topic. Rules are immutable once handed to the engine; edits are
//! made by replacing the whole rule set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::identity::MAX_INPUT_VARIANTS;

/// Directive prefix marking an output as a redirect.
///
/// An output of the form `"=> some text"` is not returned to the caller;
/// instead `some text` is resubmitted through the matching pipeline. This is
/// the canonicalization mechanism: many phrasings redirect to one rule that
/// owns the actual responses. Redirect chains are bounded by
/// [`MAX_REDIRECT_DEPTH`](crate::engine::MAX_REDIRECT_DEPTH).
pub const REDIRECT_PREFIX: &str = "=>";

/// Unique identifier for a rule.
///
/// Assigned at authoring time and never reused. Identifiers must fit in
/// 52 bits so they can be combined with an input-variant index into a single
/// backend key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(u64);

impl RuleId {
    /// Creates a rule ID from its authoring-time value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One authored conversational rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable unique identifier.
    pub id: RuleId,

    /// Ordered input patterns. The position of the matching pattern is the
    /// input-variant index reported in [`Match`](crate::Match) records, so
    /// order is significant.
    pub inputs: Vec<String>,

    /// Ordered candidate outputs. Rotation draws from this sequence; an
    /// output starting with [`REDIRECT_PREFIX`] is resubmitted as input.
    pub outputs: Vec<String>,

    /// Partner identifiers this rule applies to. Empty means any partner.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub targets: BTreeSet<String>,

    /// Topic this rule prefers to match under. Empty means no preference.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topic: String,

    /// Topic recorded for the partner after this rule matches. Empty means
    /// "fall back to [`topic`](Self::topic)"; if both are empty the tracked
    /// topic is left unchanged.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_topic: String,
}

impl Rule {
    /// Creates a rule with the given patterns and outputs, unscoped.
    #[must_use]
    pub fn new(
        id: RuleId,
        inputs: impl IntoIterator<Item = impl Into<String>>,
        outputs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id,
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            targets: BTreeSet::new(),
            topic: String::new(),
            next_topic: String::new(),
        }
    }

    /// Scopes the rule to the given conversation partners.
    #[must_use]
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the topic this rule prefers to match under.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Sets the topic recorded after this rule matches.
    #[must_use]
    pub fn with_next_topic(mut self, next_topic: impl Into<String>) -> Self {
        self.next_topic = next_topic.into();
        self
    }

    /// Builds a redirect output pointing at `input`.
    #[must_use]
    pub fn redirect(input: &str) -> String {
        format!("{REDIRECT_PREFIX} {input}")
    }

    /// Returns the redirect payload if `output` is a redirect directive.
    #[must_use]
    pub fn redirect_target(output: &str) -> Option<&str> {
        output.strip_prefix(REDIRECT_PREFIX).map(str::trim)
    }

    /// Returns true if this rule is scoped to specific partners.
    #[must_use]
    pub fn is_targeted(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Returns true if any input pattern contains a wildcard token.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.inputs.iter().any(|i| i.contains('*'))
    }

    /// Returns true if this rule prefers a tracked topic.
    #[must_use]
    pub fn requires_topic(&self) -> bool {
        !self.topic.is_empty()
    }

    /// The topic label to record after this rule matches.
    ///
    /// Empty when the rule changes no topic.
    #[must_use]
    pub fn recorded_topic(&self) -> &str {
        if self.next_topic.is_empty() {
            &self.topic
        } else {
            &self.next_topic
        }
    }

    /// Validates the rule for index registration.
    ///
    /// The index builder calls this and skips rules that fail, logging the
    /// configuration error instead of aborting the rebuild.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.inputs.is_empty() {
            return Err(RuleError::EmptyInputs { rule_id: self.id });
        }
        if self.inputs.len() > MAX_INPUT_VARIANTS {
            return Err(RuleError::TooManyInputs {
                rule_id: self.id,
                count: self.inputs.len(),
                max: MAX_INPUT_VARIANTS,
            });
        }
        if self.outputs.iter().all(|o| o.trim().is_empty()) {
            return Err(RuleError::EmptyOutputs { rule_id: self.id });
        }
        Ok(())
    }
}
