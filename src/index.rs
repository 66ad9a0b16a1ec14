//! Pattern index builder.
//!
//! Compiles the active rule set into one queryable pattern partition per
//! target: the any-target partition for unscoped rules, plus one partition
//! for every partner named by at least one rule. Rebuilds are deterministic
//! for an unchanged rule set, and configuration errors are localized: a rule
//! (or single input variant) that fails validation is skipped with a logged
//! error, never aborting the rebuild.

use std::collections::HashMap;

use tracing::warn;

use crate::engine::ANY_TARGET;
use crate::error::RuleError;
use crate::identity;
use crate::matcher::{compile_pattern, PatternSet};
use crate::rule::{Rule, RuleId};
use crate::text::TextPipeline;

/// Ranking metadata for one registered pattern, looked up by backend key.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub rule_id: RuleId,
    pub input_index: usize,
    /// True when the owning rule is scoped to specific partners.
    pub targeted: bool,
    /// Topic the owning rule prefers to match under (empty: none).
    pub topic: String,
    /// Topic to record after a final match (empty: leave unchanged).
    pub next_topic: String,
    /// True when this specific pattern contains a wildcard.
    pub wildcard: bool,
    /// Authoring position of the owning rule, for deterministic tie-breaks.
    pub order: usize,
}

/// Target-partitioned pattern index over one rule-set version.
#[derive(Debug, Default)]
pub(crate) struct RuleIndex {
    partitions: HashMap<String, PatternSet>,
    candidates: HashMap<u64, Candidate>,
}

impl RuleIndex {
    /// Builds the index from `rules`, normalizing every pattern through the
    /// same `pipeline` that will normalize user input.
    pub fn build(rules: &[Rule], pipeline: &TextPipeline) -> Self {
        let mut index = Self::default();

        for (order, rule) in rules.iter().enumerate() {
            if let Err(err) = rule.validate() {
                warn!(rule_id = %rule.id, %err, "skipping rule");
                continue;
            }
            index.register(rule, order, pipeline);
        }

        index
    }

    fn register(&mut self, rule: &Rule, order: usize, pipeline: &TextPipeline) {
        for (input_index, pattern) in rule.inputs.iter().enumerate() {
            let normalized = pipeline.normalize(pattern);
            let compiled = match compile_pattern(&normalized) {
                Ok(compiled) => compiled,
                Err(reason) => {
                    let err = RuleError::InvalidPattern {
                        rule_id: rule.id,
                        input_index,
                        reason,
                    };
                    warn!(%err, "skipping input variant");
                    continue;
                }
            };

            let key = identity::pack(rule.id, input_index);
            self.candidates.insert(
                key,
                Candidate {
                    rule_id: rule.id,
                    input_index,
                    targeted: rule.is_targeted(),
                    topic: rule.topic.clone(),
                    next_topic: rule.next_topic.clone(),
                    wildcard: compiled.has_wildcard(),
                    order,
                },
            );

            if rule.targets.is_empty() {
                self.partitions
                    .entry(ANY_TARGET.to_string())
                    .or_default()
                    .insert(key, compiled);
            } else {
                for target in &rule.targets {
                    self.partitions
                        .entry(target.clone())
                        .or_default()
                        .insert(key, compiled.clone());
                }
            }
        }
    }

    /// Returns ranking metadata for every pattern in the `target` partition
    /// that matches the normalized input.
    pub fn query(&self, target: &str, input: &str) -> Vec<&Candidate> {
        let Some(partition) = self.partitions.get(target) else {
            return Vec::new();
        };
        partition
            .matching_keys(input)
            .into_iter()
            .filter_map(|key| self.candidates.get(&key))
            .collect()
    }

    #[cfg(test)]
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}
