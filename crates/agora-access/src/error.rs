use agora_storage::StoreError;
use thiserror::Error;

/// Errors raised by permission resolution and administration.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Input rejected before any storage call was made.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AccessError {
    /// Lift a store-side validation failure into the access layer's own variant.
    pub(crate) fn from_validation(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => AccessError::Validation(msg),
            other => AccessError::Storage(other),
        }
    }
}
