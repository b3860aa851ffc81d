/// Closed set of errors the ledger core reports to its callers.
///
/// Transport adapters map these onto status codes with an exhaustive match;
/// the core never deals in statuses itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid account id")]
    InvalidAccountId,

    #[error("invalid sender account id")]
    InvalidSourceAccountId,

    #[error("invalid receiver account id")]
    InvalidDestinationAccountId,

    #[error("sender and receiver account ids must be different")]
    SameSourceAndDestinationId,

    #[error("invalid amount")]
    InvalidAmount,

    #[error("initial balance cannot be negative")]
    NegativeBalance,

    #[error("account already exists")]
    AccountExists,

    #[error("account not found")]
    AccountNotFound,

    #[error("sender account not found")]
    SourceAccountNotFound,

    #[error("receiver account not found")]
    DestinationAccountNotFound,

    #[error("insufficient funds in sender account")]
    InsufficientBalance,

    #[error("account creation failed")]
    AccountCreationFailed,

    /// Coarse failure for anything that goes wrong inside a transfer's unit
    /// of work. The whole unit rolled back, so the caller only learns that
    /// the operation did not happen, not where it stopped. Safe to retry.
    #[error("transaction failed")]
    TransactionFailed,

    #[error("internal storage error")]
    Internal,
}

/// Errors reported by the storage boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    /// The store gave up waiting for a row lock. Stands in for the deadlock
    /// detection a SQL backend performs on its own.
    #[error("lock wait timed out")]
    LockTimeout,

    #[error("row already exists")]
    Duplicate,

    #[error("storage backend: {0}")]
    Backend(String),
}
