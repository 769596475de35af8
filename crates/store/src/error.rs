use thiserror::Error;

/// Errors that can occur when interacting with the order and cart stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert collided with an existing order number. Callers
    /// regenerate the number and retry.
    #[error("Order number already exists: {order_number}")]
    DuplicateOrderNumber { order_number: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
