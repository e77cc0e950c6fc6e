//! Application registry for gantry.
//!
//! Persists one record per application: its config document, derived
//! project metadata, the chosen provider and resource, and a bounded
//! history of deployment attempts. Backed by redb so every update is a
//! real transaction; the history append-and-trim happens atomically.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{RegistryError, RegistryResult};
pub use store::RegistryStore;
pub use types::{
    AppPatch, AppRecord, DeploymentRecord, FAILURE_LINE_MAX_CHARS, FAILURE_LOG_LINES,
    HISTORY_LIMIT, clip_failure_log,
};
