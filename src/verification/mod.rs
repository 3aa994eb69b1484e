//! Verification lifecycle and trust-weighted consensus.
//!
//! - [`VerificationService`] upserts one verification per `(website, verifier)` and
//!   hands out the verification queue.
//! - [`aggregate`] folds a website's verifications into consensus criteria.
//! - [`Aggregator`] applies that fold in incremental batches, driven periodically by
//!   [`AggregationScheduler`].

pub mod aggregator;
pub mod consensus;
pub mod lifecycle;
pub mod scheduler;
pub mod types;


pub use aggregator::Aggregator;
pub use consensus::aggregate;
pub use lifecycle::VerificationService;
pub use scheduler::AggregationScheduler;
pub use types::{AggregationReport, Consensus, QueueEntry, SubmitOutcome, VerificationQueue};
