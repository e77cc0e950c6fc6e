//! Deploy queue for gantry.
//!
//! One lane per application key: at most one deploy runs at a time for a
//! given application, while deploys for different applications proceed in
//! parallel. Jobs that arrive on a busy lane wait in FIFO order and are
//! promoted automatically when the running job finishes.

pub mod queue;

pub use queue::{Admission, DeployQueue, JobFn, JobFuture, LaneStatus, job};
