//! Domain error types.

use common::{OrderId, ProductId, UserId};
use thiserror::Error;

use crate::order::OrderStatus;

/// Errors that can occur during domain operations.
///
/// Every variant maps to a machine-checkable kind via [`DomainError::kind`],
/// so callers can render actionable errors without parsing messages.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Order does not exist (or the id is unknown to the store).
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// The user has no cart yet.
    #[error("Cart not found for user {user_id}")]
    CartNotFound { user_id: UserId },

    /// Checkout attempted with no items in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Product missing from the inventory service, or its record was
    /// malformed.
    #[error("Product not available: {product_id}")]
    ProductUnavailable { product_id: ProductId },

    /// Live stock is lower than the requested quantity.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// No verified caller identity was present.
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller is authenticated but not permitted to perform the action.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: &'static str },

    /// The target status is not reachable from the current status.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The action is not legal for the order's current status.
    #[error("Cannot {action} order with status {status} (allowed: {allowed})")]
    InvalidState {
        status: OrderStatus,
        action: &'static str,
        allowed: &'static str,
    },

    /// Malformed caller input.
    #[error("{message}")]
    InvalidArgument { message: String },
}

impl DomainError {
    /// Stable, machine-checkable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::OrderNotFound { .. } | DomainError::CartNotFound { .. } => "NOT_FOUND",
            DomainError::ProductUnavailable { .. } => "PRODUCT_UNAVAILABLE",
            DomainError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            DomainError::EmptyCart => "EMPTY_CART",
            DomainError::Unauthenticated => "UNAUTHENTICATED",
            DomainError::Forbidden { .. } => "FORBIDDEN",
            DomainError::InvalidTransition { .. } | DomainError::InvalidState { .. } => {
                "INVALID_STATE"
            }
            DomainError::InvalidArgument { .. } => "INVALID_ARGUMENT",
        }
    }
}
