//! The 30 agent-friendliness criteria and the level calculator.
//!
//! Criteria are a closed enum ([`CriterionId`]) and a fixed-size ordered set
//! ([`CriteriaSet`]) shared by websites (consensus values) and verifications
//! (one verifier's opinion), so the two never drift apart field by field.

pub mod error;
pub mod level;
pub mod model;


pub use error::CriteriaError;
pub use level::{LevelBreakdown, compute_level, level_breakdown};
pub use model::{CriteriaSet, CriterionId, criteria_docs};
