use serde::Serialize;

use crate::constants::{LEVEL_COUNT, LEVEL_PASS_THRESHOLD, MAX_LEVEL};

use super::model::CriteriaSet;

/// Computes the cumulative level (0..=5) of a criteria set.
///
/// Level `L` is attained when at least [`LEVEL_PASS_THRESHOLD`] of its six criteria
/// hold and level `L - 1` is attained. Evaluation stops at the first failing level,
/// so passes in higher levels never count once a lower one fails.
pub fn compute_level(criteria: &CriteriaSet) -> u8 {
    for level in 1..=MAX_LEVEL {
        if criteria.passed_in_level(level) < LEVEL_PASS_THRESHOLD {
            return level - 1;
        }
    }
    MAX_LEVEL
}

/// Per-level pass counts alongside the computed level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelBreakdown {
    pub level: u8,
    /// `passed[i]` is the number of true criteria in level `i + 1`.
    pub passed: [usize; LEVEL_COUNT],
}

impl LevelBreakdown {
    /// First level that failed the threshold, if any.
    pub fn blocking_level(&self) -> Option<u8> {
        (self.level < MAX_LEVEL).then_some(self.level + 1)
    }
}

/// Computes the level and how many criteria passed in each level.
pub fn level_breakdown(criteria: &CriteriaSet) -> LevelBreakdown {
    let mut passed = [0usize; LEVEL_COUNT];
    for (i, slot) in passed.iter_mut().enumerate() {
        *slot = criteria.passed_in_level(i as u8 + 1);
    }
    LevelBreakdown {
        level: compute_level(criteria),
        passed,
    }
}
