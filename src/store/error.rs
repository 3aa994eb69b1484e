use std::path::PathBuf;

use thiserror::Error;

use crate::directory::{PrincipalId, WebsiteId};

/// Errors returned by [`DirectoryStore`](super::DirectoryStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Website does not exist (or was deleted concurrently).
    #[error("website not found: {id}")]
    WebsiteNotFound { id: WebsiteId },

    /// Another website already uses this domain.
    #[error("website already exists: {domain}")]
    DuplicateDomain { domain: String },

    /// Principal is unknown to the store.
    #[error("principal not found: {id}")]
    PrincipalNotFound { id: PrincipalId },

    /// Debit would take the balance below zero.
    #[error("insufficient search quota for principal {id} (balance {balance})")]
    InsufficientQuota { id: PrincipalId, balance: i64 },

    /// Backend could not be reached.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// Snapshot file could not be read or written.
    #[error("snapshot I/O failed at {path}: {source}")]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot contents were not valid.
    #[error("snapshot format error: {0}")]
    SnapshotFormat(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
