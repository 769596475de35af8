//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Status flow:
/// ```text
/// Pending ──► Confirmed ──► Processing ──► Shipped ──► Delivered ──► Returned
///    │            │             │
///    └────────────┴─────────────┴──► Cancelled
/// ```
///
/// Cancellation is only possible before shipping. Delivered orders may be
/// returned within the return window (the window itself is enforced
/// elsewhere). Cancelled orders can be redone, which creates a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Initial status at checkout. Awaiting seller confirmation.
    #[default]
    Pending,

    /// Seller has confirmed the order and will process it.
    Confirmed,

    /// Order is being prepared for shipment.
    Processing,

    /// Order has been handed to the carrier. No longer cancellable.
    Shipped,

    /// Order reached the buyer. Can still be returned.
    Delivered,

    /// Order was cancelled before shipping. Eligible for redo.
    Cancelled,

    /// Order was returned after delivery.
    Returned,
}

impl OrderStatus {
    /// Returns true if `next` is a legal successor of this status.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Delivered, Returned)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Processing, Cancelled)
        )
    }

    /// Returns true if the order can still be cancelled.
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }

    /// Returns true if the order is eligible for soft delete.
    pub fn is_removable(self) -> bool {
        matches!(
            self,
            OrderStatus::Cancelled | OrderStatus::Delivered | OrderStatus::Returned
        )
    }

    /// Returns true if a new order can be created from this one.
    pub fn is_redo_eligible(self) -> bool {
        self == OrderStatus::Cancelled
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Returned)
    }

    /// Human-readable list of cancellable statuses, for error messages.
    pub const CANCELLABLE: &'static str = "PENDING, CONFIRMED, PROCESSING";

    /// Human-readable list of removable statuses, for error messages.
    pub const REMOVABLE: &'static str = "CANCELLED, DELIVERED, RETURNED";

    /// Returns the status name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Returned => "RETURNED",
        }
    }

    /// Parses a status from its wire form.
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "CONFIRMED" => Some(OrderStatus::Confirmed),
            "PROCESSING" => Some(OrderStatus::Processing),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "RETURNED" => Some(OrderStatus::Returned),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
