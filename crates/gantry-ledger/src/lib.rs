//! Gate ledger for gantry deployments.
//!
//! Every application gets one ledger: an ordered checklist of deployment
//! stages plus an append-only progress log. The ledger is the source of
//! truth for "how far did this deploy get" and survives process restarts
//! as a markdown file on disk.
//!
//! Stages unlock strictly in order. Marking stage `n` done is rejected
//! unless every stage below `n` is already done, so a crashed pipeline
//! can always resume from [`Ledger::next_actionable`] without guessing.

pub mod error;
pub mod format;
pub mod ledger;
pub mod store;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{Ledger, NextAction, ProgressEntry, StageState};
pub use store::LedgerStore;
