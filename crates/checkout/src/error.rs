use domain::DomainError;
use store::StoreError;
use thiserror::Error;

use crate::inventory::InventoryError;

/// Errors from checkout and cart operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The order or cart store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The inventory service failed during validation, where its answer
    /// is required.
    #[error(transparent)]
    Upstream(#[from] InventoryError),

    /// A concurrent writer changed the order first. The caller should
    /// re-read and retry.
    #[error("Order was modified concurrently: {message}")]
    Conflict { message: String },
}

impl CheckoutError {
    /// Stable, machine-checkable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckoutError::Domain(e) => e.kind(),
            CheckoutError::Store(_) => "STORAGE",
            CheckoutError::Upstream(_) => "UPSTREAM_UNAVAILABLE",
            CheckoutError::Conflict { .. } => "CONFLICT",
        }
    }
}

/// Result type for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
