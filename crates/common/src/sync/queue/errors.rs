use thiserror::Error;

use crate::error::CommonError;
use crate::{impl_error_classification, impl_error_conversion};

/// Offline queue errors
///
/// Returned by every mutating queue operation. Conversions from
/// `serde_json::Error` and `std::io::Error` go through `CommonError`, so the
/// `?` operator works directly on store and serialization calls.
///
/// ## Lock Poisoning
///
/// Methods that take the queue lock convert `PoisonError` into
/// `CommonError::lock` instead of panicking.
///
/// The type is `Clone` because one processing pass is shared by every caller
/// awaiting it, and each of them receives its own copy of the outcome.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    // Lock, serialization and persistence failures
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("Offline queue is full ({0} operations) and has no completed entries to evict")]
    CapacityExceeded(usize),

    #[error("Queued operation not found: {0}")]
    ItemNotFound(String),

    #[error("Duplicate queued operation ID: {0}")]
    DuplicateOperation(String),

    #[error("Queued operation is being processed: {0}")]
    OperationInProgress(String),

    #[error("Invalid queue state: {0}")]
    InvalidState(String),
}

impl_error_conversion!(QueueError, Common);

impl_error_classification!(QueueError, Common,
    Self::CapacityExceeded(_) => true,  // completing operations frees space
    Self::ItemNotFound(_) => false,
    Self::DuplicateOperation(_) => false,
    Self::OperationInProgress(_) => true,
    Self::InvalidState(_) => false,
);

impl From<QueueError> for CommonError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Common(e) => e,
            QueueError::CapacityExceeded(size) => {
                CommonError::internal(format!("Offline queue capacity exceeded: {size}"))
            }
            QueueError::ItemNotFound(id) => CommonError::not_found_with_id("queued_operation", id),
            QueueError::DuplicateOperation(id) => {
                CommonError::internal(format!("Duplicate queued operation: {id}"))
            }
            QueueError::OperationInProgress(id) => {
                CommonError::internal(format!("Queued operation in progress: {id}"))
            }
            QueueError::InvalidState(msg) => {
                CommonError::internal(format!("Invalid queue state: {msg}"))
            }
        }
    }
}

/// Queue operation result type
pub type QueueResult<T> = Result<T, QueueError>;
