//! Ledger error types.

use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A ledger file already exists for this application.
    #[error("ledger already exists for application '{0}'")]
    AlreadyExists(String),

    /// No ledger file on disk for this application.
    #[error("no ledger for application '{0}'")]
    MissingLedger(String),

    /// The stage index does not exist in the ledger.
    #[error("stage {0} not found")]
    NotFound(u32),

    /// The stage was already marked done.
    #[error("stage {0} is already done")]
    AlreadyDone(u32),

    /// A stage was marked done out of order.
    #[error("stage {got} is out of order; next actionable stage is {expected}")]
    OutOfOrder { expected: u32, got: u32 },

    /// The ledger file on disk is not in the expected shape.
    #[error("malformed ledger: {0}")]
    Parse(String),

    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),
}
