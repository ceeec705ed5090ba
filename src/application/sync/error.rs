//! Errors surfaced by the sync coordinators.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::ports::{ApiError, StorageError};

/// Failure of a cart or wishlist operation.
///
/// Ordinary remote failures during a mutation are not returned as errors:
/// local state is kept and the aggregate's `SyncState` becomes `Error`. Only
/// conditions the caller must act on come back here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Local storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Remote sync failed: {0}")]
    Remote(#[from] ApiError),

    #[error("Migration stopped with {remaining} line(s) still pending: {source}")]
    MigrationIncomplete {
        remaining: usize,
        #[source]
        source: ApiError,
    },
}

impl SyncError {
    pub fn is_unauthorized(&self) -> bool {
        match self {
            SyncError::Remote(e) | SyncError::MigrationIncomplete { source: e, .. } => {
                e.is_unauthorized()
            }
            _ => false,
        }
    }
}

impl From<SyncError> for DomainError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Validation(e) => e.into(),
            SyncError::Storage(e) => DomainError::new(ErrorCode::StorageError, e.to_string()),
            SyncError::Remote(e) => e.into(),
            SyncError::MigrationIncomplete { remaining, source } => {
                DomainError::from(source).with_detail("pending_lines", remaining.to_string())
            }
        }
    }
}
