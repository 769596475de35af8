//! Embedded value objects of the order document.

use chrono::{DateTime, Utc};
use common::{Money, ProductId, Role, UserId};
use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// A single line of an order.
///
/// All product fields are snapshotted at checkout so that order history
/// stays accurate even if the product is later renamed, repriced, or
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Reference back to the product, for reordering.
    pub product_id: ProductId,

    /// Snapshotted product name.
    pub product_name: String,

    /// Snapshotted product description.
    pub product_description: String,

    /// Snapshotted price per unit.
    pub price_at_purchase: Money,

    /// Quantity ordered. Always at least 1.
    pub quantity: u32,

    /// Line subtotal: `price_at_purchase * quantity`.
    pub subtotal: Money,

    /// Seller who owns the product. Used for seller order queries.
    pub seller_id: UserId,

    /// Snapshotted seller display name.
    pub seller_name: String,

    /// First media id of the product, for thumbnails in order history.
    pub thumbnail_media_id: Option<String>,
}

impl OrderItem {
    /// Creates an order line from snapshotted product data, computing the
    /// line subtotal.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        product_description: impl Into<String>,
        price_at_purchase: Money,
        quantity: u32,
        seller_id: UserId,
        seller_name: impl Into<String>,
        thumbnail_media_id: Option<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            product_description: product_description.into(),
            price_at_purchase,
            quantity,
            subtotal: price_at_purchase.multiply(quantity),
            seller_id,
            seller_name: seller_name.into(),
            thumbnail_media_id,
        }
    }

    /// Recomputes the line subtotal from price and quantity.
    pub fn recalculate_subtotal(&mut self) {
        self.subtotal = self.price_at_purchase.multiply(self.quantity);
    }
}

/// Delivery address, snapshotted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone_number: Option<String>,
}

impl ShippingAddress {
    /// Returns a multi-line formatted address for display.
    pub fn formatted(&self) -> String {
        let mut out = format!("{}\n{}", self.full_name, self.address_line1);
        if let Some(line2) = self.address_line2.as_deref().filter(|l| !l.is_empty()) {
            out.push_str(", ");
            out.push_str(line2);
        }
        out.push_str(&format!("\n{}, {}\n{}", self.city, self.postal_code, self.country));
        if let Some(phone) = self.phone_number.as_deref().filter(|p| !p.is_empty()) {
            out.push_str("\nPhone: ");
            out.push_str(phone);
        }
        out
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

/// One entry of the append-only status history.
///
/// History entries are never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status before the change. None for the creation entry.
    pub previous_status: Option<OrderStatus>,

    /// Status after the change.
    pub new_status: OrderStatus,

    /// User who triggered the change.
    pub changed_by: UserId,

    /// Role of that user.
    pub changed_by_role: Role,

    /// Reason for the change; required for cancellations.
    pub reason: String,

    /// When the change occurred.
    pub changed_at: DateTime<Utc>,
}
