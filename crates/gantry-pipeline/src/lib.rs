//! Deploy pipeline for gantry.
//!
//! This crate ties the subsystems together: the registry holds what to
//! deploy, the ledger tracks how far each deploy got, the queue serializes
//! deploys per application, providers do the hosting work, the health
//! verifier gates success, and the stream broadcasts progress. The
//! [`Orchestrator`] is the single entry point the API layer talks to.
//!
//! A deploy walks 11 ordered gates and is resumable: every completed gate
//! is checked off in the application's ledger, so a crashed or halted
//! pipeline picks up at the first unchecked gate on the next trigger.

pub mod error;
pub mod orchestrator;
mod runner;
pub mod status;

pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{DeployReceipt, Orchestrator};
pub use status::{AppStatus, StageStatus};
