//! Error types for the tripcal store.

use thiserror::Error;

use crate::provider::ProviderError;

/// Errors that can occur in store operations.
///
/// Lookups that simply find nothing return `Ok(None)`; `NotFound` is
/// reserved for `update`, whose identity-resolution step requires exactly
/// one matching row.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A read primitive could not execute.
    #[error("calendar query failed: {0}")]
    Query(#[from] ProviderError),

    /// The provider rejected a write, or applied it to an unexpected
    /// number of rows.
    #[error("write rejected: {0}")]
    WriteRejected(String),

    /// Identity resolution matched more than one row for a lookup that
    /// must identify exactly one event.
    #[error("event identity for uid '{uid}' is ambiguous: {matches} candidate rows")]
    Ambiguous { uid: String, matches: usize },

    /// `update` could not find the event it was asked to modify.
    #[error("no event matching uid '{uid}'")]
    NotFound { uid: String },

    /// The event failed local validation before any provider round trip.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
