//! Match identity.
//!
//! A match is reported to callers as an explicit `(rule id, input index)`
//! record. The pattern backend, however, wants one opaque integer key per
//! registered pattern, so the two fields are packed into a single `u64`:
//! the input-variant index occupies the low 12 bits and the rule id the
//! remaining 52. 4096 input variants per rule is far more than authored
//! rule sets use, and 2^52 distinct rule ids is effectively unbounded.

use serde::{Deserialize, Serialize};

use crate::rule::RuleId;

const INPUT_INDEX_BITS: u32 = 12;
const INPUT_INDEX_MASK: u64 = 0xfff;

/// Maximum number of input variants a single rule may carry.
pub const MAX_INPUT_VARIANTS: usize = 1 << INPUT_INDEX_BITS;

/// Identifies which rule and which of its input variants produced a response.
///
/// Input indices are stable for the lifetime of one rule-set version;
/// replacing the rule set renumbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    /// The matched rule.
    pub rule_id: RuleId,
    /// Position of the matching pattern in the rule's `inputs` sequence.
    pub input_index: usize,
}

impl Match {
    /// Creates a match record.
    #[must_use]
    pub const fn new(rule_id: RuleId, input_index: usize) -> Self {
        Self {
            rule_id,
            input_index,
        }
    }
}

/// Packs a rule id and input-variant index into one backend key.
///
/// Callers must have validated `input_index < MAX_INPUT_VARIANTS`
/// (see `Rule::validate`).
pub(crate) fn pack(rule_id: RuleId, input_index: usize) -> u64 {
    debug_assert!(input_index < MAX_INPUT_VARIANTS);
    (rule_id.value() << INPUT_INDEX_BITS) | (input_index as u64 & INPUT_INDEX_MASK)
}

/// Recovers the match record from a packed backend key.
pub(crate) fn unpack(key: u64) -> Match {
    Match {
        rule_id: RuleId::new(key >> INPUT_INDEX_BITS),
        input_index: (key & INPUT_INDEX_MASK) as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_round_trip() {
        let m = unpack(pack(RuleId::new(7), 1));
        assert_eq!(m, Match::new(RuleId::new(7), 1));
    }

    #[test]
    fn test_pack_zero() {
        assert_eq!(pack(RuleId::new(0), 0), 0);
        assert_eq!(unpack(0), Match::new(RuleId::new(0), 0));
    }

    #[test]
    fn test_pack_max_index() {
        let m = unpack(pack(RuleId::new(42), MAX_INPUT_VARIANTS - 1));
        assert_eq!(m.rule_id, RuleId::new(42));
        assert_eq!(m.input_index, MAX_INPUT_VARIANTS - 1);
    }

    #[test]
    fn test_distinct_keys() {
        let a = pack(RuleId::new(1), 0);
        let b = pack(RuleId::new(0), 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_large_rule_id() {
        let id = RuleId::new((1 << 52) - 1);
        let m = unpack(pack(id, 5));
        assert_eq!(m.rule_id, id);
        assert_eq!(m.input_index, 5);
    }
}
