//! Priority resolution.
//!
//! When several registered patterns match the same input, exactly one must
//! win. The tie-break order is fixed:
//!
//! 1. a rule scoped to specific partners beats an unscoped rule;
//! 2. with topic preference enabled and a non-empty tracked topic, a rule
//!    expecting that exact topic beats one that does not;
//! 3. a pattern without wildcards beats one with them;
//! 4. remaining ties fall back to rule authoring order.
//!
//! The first differentiator wins, which keeps selection deterministic for
//! an unchanged rule set.

use crate::index::Candidate;

/// Inputs that bias candidate ranking for one query.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PriorityContext<'a> {
    /// Whether the `prefer-current-topic` property is enabled.
    pub prefer_topic: bool,
    /// The tracked topic for the active partner (may be empty).
    pub current_topic: &'a str,
}

impl PriorityContext<'_> {
    fn topic_matches(&self, candidate: &Candidate) -> bool {
        self.prefer_topic
            && !self.current_topic.is_empty()
            && candidate.topic == self.current_topic
    }
}

/// Picks the single winning candidate, or `None` when there are none.
pub(crate) fn resolve<'a>(
    candidates: &[&'a Candidate],
    ctx: &PriorityContext<'_>,
) -> Option<&'a Candidate> {
    candidates
        .iter()
        .copied()
        .min_by_key(|c| {
            (
                !c.targeted,
                !ctx.topic_matches(c),
                c.wildcard,
                c.order,
                c.input_index,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleId;

    fn candidate(id: u64, order: usize) -> Candidate {
        Candidate {
            rule_id: RuleId::new(id),
            input_index: 0,
            targeted: false,
            topic: String::new(),
            next_topic: String::new(),
            wildcard: false,
            order,
        }
    }

    fn no_topic() -> PriorityContext<'static> {
        PriorityContext {
            prefer_topic: false,
            current_topic: "",
        }
    }

    #[test]
    fn test_empty_candidates() {
        assert!(resolve(&[], &no_topic()).is_none());
    }

    #[test]
    fn test_targeted_beats_generic() {
        let mut a = candidate(1, 0);
        a.wildcard = true; // even a wildcard targeted rule wins
        a.targeted = true;
        let b = candidate(2, 1);

        let won = resolve(&[&b, &a], &no_topic()).unwrap();
        assert_eq!(won.rule_id, RuleId::new(1));
    }

    #[test]
    fn test_exact_beats_wildcard() {
        let mut a = candidate(1, 0);
        a.wildcard = true;
        let b = candidate(2, 1);

        let won = resolve(&[&a, &b], &no_topic()).unwrap();
        assert_eq!(won.rule_id, RuleId::new(2));
    }

    #[test]
    fn test_topic_match_beats_no_topic() {
        let mut a = candidate(1, 0);
        a.topic = "football".to_string();
        let mut b = candidate(2, 1);
        b.topic = "cars".to_string();

        let ctx = PriorityContext {
            prefer_topic: true,
            current_topic: "cars",
        };
        let won = resolve(&[&a, &b], &ctx).unwrap();
        assert_eq!(won.rule_id, RuleId::new(2));
    }

    #[test]
    fn test_topic_ignored_when_preference_disabled() {
        let a = candidate(1, 0);
        let mut b = candidate(2, 1);
        b.topic = "cars".to_string();

        let ctx = PriorityContext {
            prefer_topic: false,
            current_topic: "cars",
        };
        let won = resolve(&[&a, &b], &ctx).unwrap();
        assert_eq!(won.rule_id, RuleId::new(1));
    }

    #[test]
    fn test_target_outranks_topic() {
        let mut a = candidate(1, 0);
        a.topic = "cars".to_string();
        let mut b = candidate(2, 1);
        b.targeted = true;

        let ctx = PriorityContext {
            prefer_topic: true,
            current_topic: "cars",
        };
        let won = resolve(&[&a, &b], &ctx).unwrap();
        assert_eq!(won.rule_id, RuleId::new(2));
    }

    #[test]
    fn test_authoring_order_is_final_arbiter() {
        let a = candidate(5, 3);
        let b = candidate(9, 1);

        let won = resolve(&[&a, &b], &no_topic()).unwrap();
        assert_eq!(won.rule_id, RuleId::new(9));
    }
}
