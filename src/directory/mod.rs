//! Websites, verifications and principals, plus registration and lookup.

pub mod domain;
pub mod model;
pub mod registry;


pub use domain::normalize_domain;
pub use model::{
    NewWebsite, Principal, PrincipalId, Verification, VerificationId, Website, WebsiteId,
};
pub use registry::{IndexingHook, Registration, Registry, WebsiteAnalytics, WebsiteDetail};
