//! Authorization guard.
//!
//! Every order mutation goes through one of these checks before any state
//! changes. The guards take the verified [`Caller`] explicitly; there is
//! no ambient security context to consult.

use common::Caller;

use crate::error::DomainError;
use crate::order::{Order, OrderStatus};

/// Requires that the caller is the buyer who placed the order.
pub fn require_buyer(caller: &Caller, order: &Order) -> Result<(), DomainError> {
    if order.buyer_id != caller.user_id {
        return Err(DomainError::Forbidden {
            reason: "only the buyer may perform this action",
        });
    }
    Ok(())
}

/// Requires that the caller is a seller with items in the order.
pub fn require_seller_in_order(caller: &Caller, order: &Order) -> Result<(), DomainError> {
    if !caller.is_seller() {
        return Err(DomainError::Forbidden {
            reason: "only sellers may perform this action",
        });
    }
    if !order.involves_seller(caller.user_id) {
        return Err(DomainError::Forbidden {
            reason: "seller has no items in this order",
        });
    }
    Ok(())
}

/// Requires that the caller may view the order: the buyer, or a seller
/// with items in it.
pub fn require_order_access(caller: &Caller, order: &Order) -> Result<(), DomainError> {
    if order.buyer_id == caller.user_id {
        return Ok(());
    }
    if caller.is_seller() && order.involves_seller(caller.user_id) {
        return Ok(());
    }
    Err(DomainError::Forbidden {
        reason: "order belongs to another user",
    })
}

/// Requires that the order can still be cancelled.
pub fn require_cancellable(order: &Order) -> Result<(), DomainError> {
    if !order.status.is_cancellable() {
        return Err(DomainError::InvalidState {
            status: order.status,
            action: "cancel",
            allowed: OrderStatus::CANCELLABLE,
        });
    }
    Ok(())
}

/// Requires that the order is eligible for soft delete.
pub fn require_removable(order: &Order) -> Result<(), DomainError> {
    if !order.status.is_removable() {
        return Err(DomainError::InvalidState {
            status: order.status,
            action: "remove",
            allowed: OrderStatus::REMOVABLE,
        });
    }
    Ok(())
}

/// Requires that a new order may be created from this one.
pub fn require_redo_eligible(order: &Order) -> Result<(), DomainError> {
    if !order.status.is_redo_eligible() {
        return Err(DomainError::InvalidState {
            status: order.status,
            action: "redo",
            allowed: "CANCELLED",
        });
    }
    Ok(())
}
