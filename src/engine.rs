//! The response engine facade.
//!
//! [`ResponseEngine`] owns the rule set, the derived pattern index, the
//! per-partner topic state and the per-rule rotation state, all behind one
//! mutex. `set_rules` replaces the rule set wholesale and marks the index
//! dirty; `get_response` rebuilds it lazily before matching, so a call in
//! flight sees either the whole old set or the whole new one, never a mix.
//!
//! Redirect outputs are resolved with an iterative loop inside a single
//! lock acquisition, bounded by [`MAX_REDIRECT_DEPTH`]. A chain that does
//! not settle on a plain output within the bound (including the A→B→A
//! 2-cycle) yields the empty response, exactly like an input that matched
//! nothing.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::identity::Match;
use crate::index::{Candidate, RuleIndex};
use crate::priority::{self, PriorityContext};
use crate::rotation::{OutputMode, OutputSelector};
use crate::rule::Rule;
use crate::text::{Lemmatizer, Sanitizer, TextPipeline};
use crate::topic::TopicTracker;

/// Sentinel partner identifier meaning "no specific conversation partner".
pub const ANY_TARGET: &str = "";

/// Maximum number of redirect hops resolved for one `get_response` call.
///
/// Engine-wide constant, deliberately not operator-configurable: bounding
/// by depth also terminates redirect cycles without cycle detection.
pub const MAX_REDIRECT_DEPTH: usize = 8;

/// Name of the boolean property biasing selection toward the tracked topic.
pub const PROP_PREFER_CURRENT_TOPIC: &str = "prefer-current-topic";

/// Name of the property selecting the output rotation mode.
pub const PROP_OUTPUT_MODE: &str = "output-mode";

/// A value assignable to an engine property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean property value.
    Bool(bool),
    /// Output rotation mode.
    Mode(OutputMode),
}

/// Result of one `get_response` call.
///
/// `matches` carries at most one record identifying the rule and input
/// variant that produced the output. Both fields are empty when nothing
/// matched, the input was blank, or the redirect bound tripped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    /// The selected output text; empty when no rule matched.
    pub output: String,
    /// The winning `(rule id, input index)` record, if any.
    pub matches: Vec<Match>,
}

impl Response {
    fn empty() -> Self {
        Self::default()
    }

    /// Returns true if this response carries no output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.matches.is_empty()
    }
}

/// Index lifecycle: `Dirty` after any change that can affect matching,
/// `Clean` once rebuilt. `get_response` performs the `Dirty -> Clean`
/// transition under the lock.
enum IndexState {
    Clean(RuleIndex),
    Dirty,
}

struct EngineState {
    rules: Vec<Rule>,
    index: IndexState,
    topics: TopicTracker,
    selector: OutputSelector,
    pipeline: TextPipeline,
    prefer_topic: bool,
}

/// Rule-based response engine.
///
/// Safe to share across threads behind an `Arc`; every operation is
/// synchronous and serialized through one internal lock.
pub struct ResponseEngine {
    state: Mutex<EngineState>,
}

impl ResponseEngine {
    /// Creates an engine with no-op sanitizers and lemmatizer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pipeline(
            Box::new(crate::text::NullSanitizer),
            Box::new(crate::text::NullLemmatizer),
            Box::new(crate::text::NullSanitizer),
        )
    }

    /// Creates an engine with the given pre-sanitizer and no-op lemmatizer
    /// and post-sanitizer.
    #[must_use]
    pub fn with_sanitizer(sanitizer: Box<dyn Sanitizer>) -> Self {
        Self::with_pipeline(
            sanitizer,
            Box::new(crate::text::NullLemmatizer),
            Box::new(crate::text::NullSanitizer),
        )
    }

    /// Creates an engine with an explicit normalization pipeline.
    #[must_use]
    pub fn with_pipeline(
        pre: Box<dyn Sanitizer>,
        lemmatizer: Box<dyn Lemmatizer>,
        post: Box<dyn Sanitizer>,
    ) -> Self {
        Self {
            state: Mutex::new(EngineState {
                rules: Vec::new(),
                index: IndexState::Dirty,
                topics: TopicTracker::new(),
                selector: OutputSelector::new(OutputMode::default()),
                pipeline: TextPipeline {
                    pre,
                    lemmatizer,
                    post,
                },
                prefer_topic: false,
            }),
        }
    }

    /// Returns the response for `input` from partner `target`.
    ///
    /// Pass [`ANY_TARGET`] when the partner is unknown or irrelevant.
    pub fn get_response(&self, input: &str, target: &str) -> Response {
        let Ok(mut guard) = self.state.lock() else {
            warn!("engine lock poisoned; returning empty response");
            return Response::empty();
        };
        let state = &mut *guard;

        if input.trim().is_empty() {
            return Response::empty();
        }

        if matches!(state.index, IndexState::Dirty) {
            debug!(rules = state.rules.len(), "rebuilding pattern index");
            let index = RuleIndex::build(&state.rules, &state.pipeline);
            state.index = IndexState::Clean(index);
        }
        let IndexState::Clean(index) = &state.index else {
            return Response::empty();
        };

        let mut current = state.pipeline.normalize(input);
        debug!(input, normalized = %current, target, "matching");

        for depth in 0..MAX_REDIRECT_DEPTH {
            let chosen: Candidate = {
                let mut candidates = index.query(target, &current);
                if candidates.is_empty() && target != ANY_TARGET {
                    candidates = index.query(ANY_TARGET, &current);
                }
                let ctx = PriorityContext {
                    prefer_topic: state.prefer_topic,
                    current_topic: state.topics.current(target),
                };
                match priority::resolve(&candidates, &ctx) {
                    Some(candidate) => candidate.clone(),
                    None => return Response::empty(),
                }
            };

            let Some(rule) = state.rules.iter().find(|r| r.id == chosen.rule_id) else {
                return Response::empty();
            };
            let Some(output) = state.selector.next(chosen.rule_id, &rule.outputs) else {
                return Response::empty();
            };
            if output.trim().is_empty() {
                // An empty output is not a valid response.
                return Response::empty();
            }

            if let Some(payload) = Rule::redirect_target(&output) {
                if payload.is_empty() {
                    return Response::empty();
                }
                debug!(depth, rule_id = %chosen.rule_id, payload, "following redirect");
                current = state.pipeline.normalize(payload);
                continue;
            }

            let recorded = if chosen.next_topic.is_empty() {
                chosen.topic.clone()
            } else {
                chosen.next_topic.clone()
            };
            state.topics.record(target, &recorded);

            return Response {
                output,
                matches: vec![Match::new(chosen.rule_id, chosen.input_index)],
            };
        }

        warn!(
            input,
            target, "redirect chain exceeded {MAX_REDIRECT_DEPTH} hops; treating as no match"
        );
        Response::empty()
    }

    /// Replaces the rule set.
    ///
    /// Marks the index dirty and clears all rotation cursors: cursors are
    /// only meaningful relative to a specific rule's output list, and the
    /// simplest correct policy on replacement is to reset them all.
    pub fn set_rules(&self, rules: Vec<Rule>) {
        let Ok(mut state) = self.state.lock() else {
            warn!("engine lock poisoned; rule set not replaced");
            return;
        };
        debug!(count = rules.len(), "setting new rule set");
        state.rules = rules;
        state.index = IndexState::Dirty;
        state.selector.clear();
    }

    /// Returns a copy of the active rule set.
    #[must_use]
    pub fn rules(&self) -> Vec<Rule> {
        self.state
            .lock()
            .map(|state| state.rules.clone())
            .unwrap_or_default()
    }

    /// Removes all rules, topics and rotation state.
    pub fn clear(&self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.rules.clear();
        state.index = IndexState::Dirty;
        state.topics.clear();
        state.selector.clear();
    }

    /// Sets an engine property, taking effect on the next match.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownProperty`] for an unrecognized name and
    /// [`EngineError::InvalidPropertyValue`] for a value of the wrong kind.
    pub fn set_property(&self, name: &str, value: PropertyValue) -> EngineResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| EngineError::internal("engine lock poisoned"))?;

        match name {
            PROP_PREFER_CURRENT_TOPIC => {
                let PropertyValue::Bool(enabled) = value else {
                    return Err(EngineError::InvalidPropertyValue {
                        name: name.to_string(),
                        expected: "boolean",
                    });
                };
                if state.prefer_topic != enabled {
                    debug!(enabled, "topic preference changed");
                    state.prefer_topic = enabled;
                    state.index = IndexState::Dirty;
                }
                Ok(())
            }
            PROP_OUTPUT_MODE => {
                let PropertyValue::Mode(mode) = value else {
                    return Err(EngineError::InvalidPropertyValue {
                        name: name.to_string(),
                        expected: "output mode",
                    });
                };
                state.selector.set_mode(mode);
                Ok(())
            }
            _ => Err(EngineError::UnknownProperty {
                name: name.to_string(),
            }),
        }
    }

    /// Reads an engine property; `None` for unrecognized names.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        let state = self.state.lock().ok()?;
        match name {
            PROP_PREFER_CURRENT_TOPIC => Some(PropertyValue::Bool(state.prefer_topic)),
            PROP_OUTPUT_MODE => Some(PropertyValue::Mode(state.selector.mode())),
            _ => None,
        }
    }

    /// Swaps the pre-match sanitizer.
    ///
    /// Registered patterns are normalized through the same pipeline as user
    /// input, so any collaborator swap marks the index dirty.
    pub fn set_pre_sanitizer(&self, sanitizer: Box<dyn Sanitizer>) {
        if let Ok(mut state) = self.state.lock() {
            state.pipeline.pre = sanitizer;
            state.index = IndexState::Dirty;
        }
    }

    /// Swaps the post-lemmatization sanitizer.
    pub fn set_post_sanitizer(&self, sanitizer: Box<dyn Sanitizer>) {
        if let Ok(mut state) = self.state.lock() {
            state.pipeline.post = sanitizer;
            state.index = IndexState::Dirty;
        }
    }

    /// Swaps the lemmatizer.
    pub fn set_lemmatizer(&self, lemmatizer: Box<dyn Lemmatizer>) {
        if let Ok(mut state) = self.state.lock() {
            state.pipeline.lemmatizer = lemmatizer;
            state.index = IndexState::Dirty;
        }
    }
}

impl Default for ResponseEngine {
    fn default() -> Self {
        Self::new()
    }
}
