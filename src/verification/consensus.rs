use crate::constants::{TRUSTED_WEIGHT, UNTRUSTED_WEIGHT, VERIFIED_COUNT_THRESHOLD};
use crate::criteria::CriterionId;
use crate::directory::{Verification, Website};

use super::types::Consensus;

#[inline]
fn weight(v: &Verification) -> u64 {
    if v.is_trusted {
        TRUSTED_WEIGHT
    } else {
        UNTRUSTED_WEIGHT
    }
}

/// Folds every verification of `website` into consensus values.
///
/// Each criterion is decided independently by strict weighted majority: true only
/// when the weight voting true exceeds half the total weight, so ties fall to
/// false. With no verifications the current criteria are kept.
///
/// `verified` never reverts: it stays true once set, and otherwise becomes true
/// when a trusted verification exists or the verification count reaches
/// [`VERIFIED_COUNT_THRESHOLD`].
pub fn aggregate(website: &Website, verifications: &[Verification]) -> Consensus {
    let mut criteria = website.criteria;
    let weighted_total: u64 = verifications.iter().map(weight).sum();

    if weighted_total > 0 {
        for id in CriterionId::ALL {
            let weighted_true: u64 = verifications
                .iter()
                .filter(|v| v.criteria.get(id))
                .map(weight)
                .sum();
            criteria.set(id, weighted_true * 2 > weighted_total);
        }
    }

    let trusted = verifications
        .iter()
        .filter(|v| v.is_trusted)
        .max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));

    let verified = website.verified
        || trusted.is_some()
        || verifications.len() >= VERIFIED_COUNT_THRESHOLD;

    Consensus {
        criteria,
        verified,
        trusted_verification: trusted.map(|v| v.id),
    }
}
