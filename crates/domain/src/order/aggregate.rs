use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use common::{Money, OrderId, Role, UserId};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::{OrderItem, OrderStatus, PaymentStatus, ShippingAddress, StatusChange};

/// Characters used for the random suffix of an order number.
const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of days from checkout to the estimated delivery date.
const ESTIMATED_DELIVERY_DAYS: i64 = 7;

/// Input for creating a new order.
///
/// Items arrive already snapshotted from live product data; the aggregate
/// derives everything else.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub buyer_id: UserId,
    pub buyer_name: String,
    pub buyer_email: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub delivery_notes: Option<String>,
    pub payment_method: Option<String>,
    /// Set when this order was created by redoing a cancelled order.
    pub original_order_id: Option<OrderId>,
    /// Reason recorded on the creation history entry. Defaults to
    /// "Order created"; redo sets one naming the original order.
    pub creation_reason: Option<String>,
}

/// An order placed by a buyer.
///
/// The aggregate owns its invariants: totals always match the items,
/// `seller_ids` always matches the sellers present in the items, and the
/// status history records every status the order has ever held, including
/// its creation. History entries are never edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Human-facing identifier, `ORD-YYYYMMDD-XXXXX`. Unique across all
    /// orders; the store enforces uniqueness.
    pub order_number: String,

    pub buyer_id: UserId,

    /// Buyer name and email, snapshotted at checkout so the order stays
    /// readable after account changes.
    pub buyer_name: String,
    pub buyer_email: String,

    pub items: Vec<OrderItem>,

    /// Distinct sellers appearing in `items`, denormalized for seller
    /// order queries.
    pub seller_ids: BTreeSet<UserId>,

    pub status: OrderStatus,
    pub status_history: Vec<StatusChange>,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,

    pub shipping_address: ShippingAddress,
    pub delivery_notes: Option<String>,

    /// Sum of all line subtotals.
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax: Money,
    pub discount: Money,

    /// `subtotal + shipping_cost + tax - discount`.
    pub total_amount: Money,

    /// Sum of all line quantities.
    pub total_items: u32,

    pub estimated_delivery_date: DateTime<Utc>,
    pub actual_delivery_date: Option<DateTime<Utc>>,

    /// Soft delete: removed orders stay in the store but disappear from
    /// buyer-facing queries.
    pub is_removed: bool,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<UserId>,

    /// The cancelled order this one was redone from, if any.
    pub original_order_id: Option<OrderId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order in `Pending` status.
    ///
    /// Rejects drafts with no items or with a zero-quantity item. Payment
    /// is recorded as `Paid` immediately: this marketplace charges at
    /// checkout.
    pub fn create(draft: OrderDraft) -> Result<Order, DomainError> {
        if draft.items.is_empty() {
            return Err(DomainError::EmptyCart);
        }
        if let Some(item) = draft.items.iter().find(|i| i.quantity == 0) {
            return Err(DomainError::InvalidArgument {
                message: format!("Item {} has zero quantity", item.product_id),
            });
        }

        let now = Utc::now();
        let buyer_id = draft.buyer_id;
        let seller_ids: BTreeSet<UserId> = draft.items.iter().map(|i| i.seller_id).collect();

        let creation = StatusChange {
            previous_status: None,
            new_status: OrderStatus::Pending,
            changed_by: buyer_id,
            changed_by_role: Role::Client,
            reason: draft
                .creation_reason
                .unwrap_or_else(|| "Order created".to_string()),
            changed_at: now,
        };

        let mut order = Order {
            id: OrderId::new(),
            order_number: generate_order_number(now),
            buyer_id,
            buyer_name: draft.buyer_name,
            buyer_email: draft.buyer_email,
            items: draft.items,
            seller_ids,
            status: OrderStatus::Pending,
            status_history: vec![creation],
            payment_status: PaymentStatus::Paid,
            payment_method: draft.payment_method,
            shipping_address: draft.shipping_address,
            delivery_notes: draft.delivery_notes,
            subtotal: Money::zero(),
            shipping_cost: Money::zero(),
            tax: Money::zero(),
            discount: Money::zero(),
            total_amount: Money::zero(),
            total_items: 0,
            estimated_delivery_date: now + Duration::days(ESTIMATED_DELIVERY_DAYS),
            actual_delivery_date: None,
            is_removed: false,
            removed_at: None,
            removed_by: None,
            original_order_id: draft.original_order_id,
            created_at: now,
            updated_at: now,
        };
        order.recalculate_totals();
        Ok(order)
    }

    /// Moves the order to `next`, recording who did it and why.
    ///
    /// Fails with [`DomainError::InvalidTransition`] when `next` is not a
    /// legal successor of the current status. Entering `Delivered` stamps
    /// the actual delivery date.
    pub fn transition(
        &mut self,
        next: OrderStatus,
        changed_by: UserId,
        changed_by_role: Role,
        reason: impl Into<String>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        let now = Utc::now();
        self.status_history.push(StatusChange {
            previous_status: Some(self.status),
            new_status: next,
            changed_by,
            changed_by_role,
            reason: reason.into(),
            changed_at: now,
        });
        self.status = next;
        if next == OrderStatus::Delivered {
            self.actual_delivery_date = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Soft-deletes the order.
    ///
    /// Only orders that have run their course (cancelled, delivered, or
    /// returned) can be removed. The order keeps its data; queries filter
    /// on `is_removed`.
    pub fn mark_removed(&mut self, removed_by: UserId) -> Result<(), DomainError> {
        if self.is_removed {
            return Ok(());
        }
        if !self.status.is_removable() {
            return Err(DomainError::InvalidState {
                status: self.status,
                action: "remove",
                allowed: OrderStatus::REMOVABLE,
            });
        }
        let now = Utc::now();
        self.is_removed = true;
        self.removed_at = Some(now);
        self.removed_by = Some(removed_by);
        self.updated_at = now;
        Ok(())
    }

    /// Recomputes `subtotal`, `total_amount`, and `total_items` from the
    /// items and the cost adjustments.
    pub fn recalculate_totals(&mut self) {
        for item in &mut self.items {
            item.recalculate_subtotal();
        }
        self.subtotal = self.items.iter().map(|i| i.subtotal).sum();
        self.total_amount = self.subtotal + self.shipping_cost + self.tax - self.discount;
        self.total_items = self.items.iter().map(|i| i.quantity).sum();
    }

    /// Assigns a fresh order number. Used when an insert collides with an
    /// existing number.
    pub fn regenerate_order_number(&mut self) {
        self.order_number = generate_order_number(self.created_at);
    }

    /// Returns true if `seller_id` has at least one item in this order.
    pub fn involves_seller(&self, seller_id: UserId) -> bool {
        self.seller_ids.contains(&seller_id)
    }
}

/// Generates an order number of the form `ORD-YYYYMMDD-XXXXX`, where the
/// suffix is five random uppercase alphanumerics.
fn generate_order_number(at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| {
            let idx = rng.gen_range(0..ORDER_NUMBER_CHARSET.len());
            ORDER_NUMBER_CHARSET[idx] as char
        })
        .collect();
    format!("ORD-{}-{}", at.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Jane Doe".to_string(),
            address_line1: "1 Harbour Rd".to_string(),
            address_line2: None,
            city: "Mariehamn".to_string(),
            postal_code: "22100".to_string(),
            country: "Finland".to_string(),
            phone_number: None,
        }
    }

    fn item(price_cents: i64, quantity: u32, seller: UserId) -> OrderItem {
        OrderItem::new(
            "prod-1",
            "Widget",
            "A widget",
            Money::from_cents(price_cents),
            quantity,
            seller,
            "Widget Shop",
            None,
        )
    }

    fn draft(items: Vec<OrderItem>) -> OrderDraft {
        OrderDraft {
            buyer_id: UserId::new(),
            buyer_name: "Jane Doe".to_string(),
            buyer_email: "jane@example.com".to_string(),
            items,
            shipping_address: address(),
            delivery_notes: None,
            payment_method: None,
            original_order_id: None,
            creation_reason: None,
        }
    }

    #[test]
    fn test_create_computes_totals_and_sellers() {
        let seller_a = UserId::new();
        let seller_b = UserId::new();
        let order = Order::create(draft(vec![
            item(1000, 2, seller_a),
            item(500, 1, seller_b),
            item(250, 4, seller_a),
        ]))
        .unwrap();

        assert_eq!(order.subtotal.cents(), 3500);
        assert_eq!(order.total_amount.cents(), 3500);
        assert_eq!(order.total_items, 7);
        assert_eq!(order.seller_ids.len(), 2);
        assert!(order.involves_seller(seller_a));
        assert!(order.involves_seller(seller_b));
    }

    #[test]
    fn test_create_starts_pending_and_paid_with_creation_history() {
        let order = Order::create(draft(vec![item(1000, 1, UserId::new())])).unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status_history.len(), 1);
        let entry = &order.status_history[0];
        assert_eq!(entry.previous_status, None);
        assert_eq!(entry.new_status, OrderStatus::Pending);
        assert_eq!(entry.changed_by, order.buyer_id);
    }

    #[test]
    fn test_create_snapshots_buyer_identity() {
        let order = Order::create(draft(vec![item(1000, 1, UserId::new())])).unwrap();
        assert_eq!(order.buyer_name, "Jane Doe");
        assert_eq!(order.buyer_email, "jane@example.com");
    }

    #[test]
    fn test_creation_reason_carries_through_to_history() {
        let mut d = draft(vec![item(1000, 1, UserId::new())]);
        d.creation_reason = Some("Redo of order ORD-20250101-AAAAA".to_string());
        let order = Order::create(d).unwrap();
        assert!(order.status_history[0]
            .reason
            .contains("ORD-20250101-AAAAA"));
    }

    #[test]
    fn test_total_reflects_cost_adjustments() {
        let mut order = Order::create(draft(vec![item(1000, 2, UserId::new())])).unwrap();
        order.shipping_cost = Money::from_cents(500);
        order.tax = Money::from_cents(200);
        order.discount = Money::from_cents(300);
        order.recalculate_totals();

        assert_eq!(order.subtotal.cents(), 2000);
        assert_eq!(order.total_amount.cents(), 2400);
    }

    #[test]
    fn test_create_rejects_empty_items() {
        let err = Order::create(draft(vec![])).unwrap_err();
        assert!(matches!(err, DomainError::EmptyCart));
    }

    #[test]
    fn test_create_rejects_zero_quantity() {
        let err = Order::create(draft(vec![item(1000, 0, UserId::new())])).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument { .. }));
    }

    #[test]
    fn test_order_number_shape() {
        let order = Order::create(draft(vec![item(1000, 1, UserId::new())])).unwrap();
        let number = &order.order_number;

        assert_eq!(number.len(), "ORD-20250101-ABCDE".len());
        assert!(number.starts_with("ORD-"));
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 5);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_regenerate_keeps_date_segment() {
        let mut order = Order::create(draft(vec![item(1000, 1, UserId::new())])).unwrap();
        let before = order.order_number.clone();
        order.regenerate_order_number();
        assert_eq!(&order.order_number[..12], &before[..12]);
    }

    #[test]
    fn test_transition_appends_exactly_one_history_entry() {
        let seller = UserId::new();
        let mut order = Order::create(draft(vec![item(1000, 1, seller)])).unwrap();

        order
            .transition(OrderStatus::Confirmed, seller, Role::Seller, "Confirmed")
            .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.status_history.len(), 2);
        let entry = &order.status_history[1];
        assert_eq!(entry.previous_status, Some(OrderStatus::Pending));
        assert_eq!(entry.new_status, OrderStatus::Confirmed);
        assert_eq!(entry.changed_by_role, Role::Seller);
    }

    #[test]
    fn test_illegal_transition_leaves_order_untouched() {
        let mut order = Order::create(draft(vec![item(1000, 1, UserId::new())])).unwrap();
        let buyer = order.buyer_id;

        let err = order
            .transition(OrderStatus::Shipped, buyer, Role::Client, "skip ahead")
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Shipped,
            }
        ));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
    }

    #[test]
    fn test_delivered_stamps_actual_delivery_date() {
        let seller = UserId::new();
        let mut order = Order::create(draft(vec![item(1000, 1, seller)])).unwrap();
        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            order.transition(next, seller, Role::Seller, "advance").unwrap();
            assert!(order.actual_delivery_date.is_none());
        }
        order
            .transition(OrderStatus::Delivered, seller, Role::Seller, "delivered")
            .unwrap();
        assert!(order.actual_delivery_date.is_some());
    }

    #[test]
    fn test_mark_removed_requires_finished_status() {
        let mut order = Order::create(draft(vec![item(1000, 1, UserId::new())])).unwrap();
        let buyer = order.buyer_id;

        let err = order.mark_removed(buyer).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState { .. }));

        order
            .transition(OrderStatus::Cancelled, buyer, Role::Client, "changed my mind")
            .unwrap();
        order.mark_removed(buyer).unwrap();
        assert!(order.is_removed);
        assert_eq!(order.removed_by, Some(buyer));
        assert!(order.removed_at.is_some());
    }

    #[test]
    fn test_mark_removed_is_idempotent() {
        let mut order = Order::create(draft(vec![item(1000, 1, UserId::new())])).unwrap();
        let buyer = order.buyer_id;
        order
            .transition(OrderStatus::Cancelled, buyer, Role::Client, "changed my mind")
            .unwrap();
        order.mark_removed(buyer).unwrap();
        let removed_at = order.removed_at;
        order.mark_removed(buyer).unwrap();
        assert_eq!(order.removed_at, removed_at);
    }

    #[test]
    fn test_estimated_delivery_a_week_out() {
        let order = Order::create(draft(vec![item(1000, 1, UserId::new())])).unwrap();
        let days = (order.estimated_delivery_date - order.created_at).num_days();
        assert_eq!(days, 7);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let order = Order::create(draft(vec![item(1000, 2, UserId::new())])).unwrap();
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
