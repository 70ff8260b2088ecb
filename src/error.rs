//! Error types for the position ledger and its backing store.
//!
//! Network collaborators (price source, screener, notifier) report through
//! `anyhow`; these enums cover the parts whose failures callers match on.

/// Failure reading or writing the persisted position set.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure of a ledger operation.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// `record` was handed a `WAIT` verdict. The confirmation gate upstream is broken.
    #[error("refusing to record unconfirmed verdict for {ticker}")]
    Unconfirmed { ticker: String },

    /// A confirmed verdict without entry, take-profit or stop-loss.
    #[error("confirmed verdict for {ticker} is missing {field}")]
    MissingLevel { ticker: String, field: &'static str },
}
