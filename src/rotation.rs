//! Output rotation.
//!
//! A rule that matches repeatedly should not answer with the same string
//! every time. The selector keeps one rotation cursor per rule: sequential
//! mode walks the output list in order and wraps; random mode draws from a
//! shuffled permutation, reshuffling on exhaustion under the constraint
//! that the first element of a new shuffle differs from the last element
//! of the previous one, so no two consecutive calls ever repeat an output
//! while the full set is still covered before any repeat.
//!
//! Rotation state is only meaningful relative to one rule-set version; the
//! engine clears it on every `set_rules`.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rule::RuleId;

/// How a matched rule's next output is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Walk the output list in authoring order, wrapping at the end.
    Sequential,
    /// Shuffled rotation without immediate repeats across reshuffles.
    Random,
}

impl Default for OutputMode {
    /// Random rotation is the default, matching how conversational rule
    /// sets are usually authored (varied responses out of the box).
    fn default() -> Self {
        Self::Random
    }
}

#[derive(Debug)]
enum RotationState {
    Sequential {
        cursor: usize,
    },
    Random {
        order: Vec<usize>,
        cursor: usize,
        last: Option<usize>,
    },
}

/// Per-rule output rotation state.
#[derive(Debug, Default)]
pub(crate) struct OutputSelector {
    mode: OutputMode,
    states: HashMap<RuleId, RotationState>,
}

impl OutputSelector {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            states: HashMap::new(),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Switches rotation mode, resetting all cursors so the change is
    /// observable on the next match.
    pub fn set_mode(&mut self, mode: OutputMode) {
        if self.mode != mode {
            self.mode = mode;
            self.states.clear();
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Returns the next output for `rule_id`, advancing its cursor.
    ///
    /// Returns `None` for an empty output list; the engine treats that rule
    /// as non-matching.
    pub fn next(&mut self, rule_id: RuleId, outputs: &[String]) -> Option<String> {
        if outputs.is_empty() {
            return None;
        }
        if outputs.len() == 1 {
            return Some(outputs[0].clone());
        }

        let mode = self.mode;
        let state = self.states.entry(rule_id).or_insert_with(|| match mode {
            OutputMode::Sequential => RotationState::Sequential { cursor: 0 },
            OutputMode::Random => RotationState::Random {
                order: Vec::new(),
                cursor: 0,
                last: None,
            },
        });

        let index = match state {
            RotationState::Sequential { cursor } => {
                let index = *cursor % outputs.len();
                *cursor = (index + 1) % outputs.len();
                index
            }
            RotationState::Random {
                order,
                cursor,
                last,
            } => {
                if *cursor >= order.len() || order.len() != outputs.len() {
                    *order = reshuffle(outputs.len(), *last);
                    *cursor = 0;
                }
                let index = order[*cursor];
                *cursor += 1;
                *last = Some(index);
                index
            }
        };

        Some(outputs[index].clone())
    }
}

/// Produces a fresh permutation of `0..len` whose first element differs
/// from `last` (when `len > 1`), so a reshuffle boundary never yields the
/// same output twice in a row.
fn reshuffle(len: usize, last: Option<usize>) -> Vec<usize> {
    let mut rng = rand::thread_rng();
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(&mut rng);

    if len > 1 {
        if let Some(last) = last {
            if order[0] == last {
                let other = rng.gen_range(1..len);
                order.swap(0, other);
            }
        }
    }

    order
}
