pub mod backoff;
pub mod config;
pub mod meta;
pub mod stage;
pub mod types;

pub use backoff::{BackoffPolicy, RetrySchedule, Retryable};
pub use config::GantryConfig;
pub use stage::{STAGE_COUNT, StageDef, StageId, default_stages};
pub use types::*;
