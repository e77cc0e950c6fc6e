//! Health gate for gantry.
//!
//! After a release, the pipeline refuses to mark a deploy verified until
//! the application actually answers over HTTP. This crate owns that probe:
//! a prioritized endpoint list, exact-200 matching, and a bounded wait
//! loop that reports everything it saw on the way.

pub mod verifier;

pub use verifier::{
    CheckOptions, DEFAULT_ENDPOINTS, HealthError, HealthReport, HealthResult, HealthVerifier,
    WaitReport,
};
