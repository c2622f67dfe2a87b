use thiserror::Error;

/// Errors surfaced by the core. Duplicate event inserts are absorbed at the
/// store boundary (successful no-op) and never appear here.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed window expression. Aggregation entry points recover by
    /// falling back to the configured default window; this only propagates
    /// from the resolver itself.
    #[error("invalid window format: {0:?}")]
    InvalidWindowFormat(String),

    /// Score requested over zero votes. Callers filter by minvotes before
    /// scoring, so reaching this is a contract violation, not user input.
    #[error("score requested with zero votes")]
    InsufficientVotes,

    /// Single-actor lookup matched no qualifying row.
    #[error("actor not found: {0}")]
    NotFound(String),

    /// Store failure. Propagated as-is; reads perform no internal retry.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
