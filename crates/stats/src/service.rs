//! Aggregates profile statistics from stored orders.

use std::collections::HashMap;

use common::{Caller, Money, ProductId};
use domain::{DomainError, Order, OrderStatus};
use store::{OrderStore, Page};

use crate::error::Result;
use crate::model::{BuyerStats, ProductStat, SellerStats};

/// At most this many products appear in a top-products list.
const TOP_PRODUCTS_LIMIT: usize = 5;

/// Confirmed orders count as delivered in profile statistics, matching
/// what profile pages have always shown.
fn is_delivered_like(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Delivered | OrderStatus::Confirmed)
}

fn is_pending_like(status: OrderStatus) -> bool {
    matches!(
        status,
        OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Shipped
    )
}

/// Computes buyer and seller statistics on demand from the order store.
pub struct ProfileStatsService<O>
where
    O: OrderStore,
{
    orders: O,
}

impl<O> ProfileStatsService<O>
where
    O: OrderStore,
{
    /// Creates a new statistics service.
    pub fn new(orders: O) -> Self {
        Self { orders }
    }

    /// Statistics over the caller's purchase history. Removed orders are
    /// not counted.
    #[tracing::instrument(skip_all, fields(user_id = %caller.user_id))]
    pub async fn buyer_stats(&self, caller: &Caller) -> Result<BuyerStats> {
        let orders = self
            .orders
            .list_for_buyer(caller.user_id, Page::all())
            .await?;

        let mut stats = BuyerStats {
            total_orders: 0,
            pending_orders: 0,
            delivered_orders: 0,
            cancelled_orders: 0,
            total_spent: Money::zero(),
            average_order_value: Money::zero(),
            top_products_by_amount: Vec::new(),
            top_products_by_quantity: Vec::new(),
        };
        let mut products = ProductTally::default();

        for order in &orders {
            stats.total_orders += 1;
            if is_pending_like(order.status) {
                stats.pending_orders += 1;
            } else if is_delivered_like(order.status) {
                stats.delivered_orders += 1;
            } else if order.status == OrderStatus::Cancelled {
                stats.cancelled_orders += 1;
            }

            // money counts once the order is delivered-like, not before
            if is_delivered_like(order.status) {
                stats.total_spent += order.total_amount;
                for item in &order.items {
                    products.add(&item.product_id, &item.product_name, item.quantity, item.subtotal);
                }
            }
        }

        stats.average_order_value = stats.total_spent.divide(stats.delivered_orders);
        stats.top_products_by_amount = products.top_by_amount(TOP_PRODUCTS_LIMIT);
        stats.top_products_by_quantity = products.top_by_quantity(TOP_PRODUCTS_LIMIT);
        Ok(stats)
    }

    /// Statistics over orders containing the calling seller's items.
    ///
    /// Earnings and top products cover only this seller's own lines;
    /// order counts cover every order the seller appears in.
    #[tracing::instrument(skip_all, fields(user_id = %caller.user_id))]
    pub async fn seller_stats(&self, caller: &Caller) -> Result<SellerStats> {
        if !caller.is_seller() {
            return Err(DomainError::Forbidden {
                reason: "only sellers have seller statistics",
            }
            .into());
        }

        let orders = self
            .orders
            .list_for_seller(caller.user_id, None, Page::all())
            .await?;

        let mut stats = SellerStats {
            total_orders: 0,
            pending_orders: 0,
            delivered_orders: 0,
            cancelled_orders: 0,
            total_earnings: Money::zero(),
            total_products_sold: 0,
            top_products_by_amount: Vec::new(),
            top_products_by_quantity: Vec::new(),
        };
        let mut products = ProductTally::default();

        for order in &orders {
            stats.total_orders += 1;
            if is_pending_like(order.status) {
                stats.pending_orders += 1;
            } else if is_delivered_like(order.status) {
                stats.delivered_orders += 1;
            } else if order.status == OrderStatus::Cancelled {
                stats.cancelled_orders += 1;
            }

            if is_delivered_like(order.status) {
                for item in own_items(order, caller) {
                    stats.total_earnings += item.subtotal;
                    stats.total_products_sold += u64::from(item.quantity);
                    products.add(&item.product_id, &item.product_name, item.quantity, item.subtotal);
                }
            }
        }

        stats.top_products_by_amount = products.top_by_amount(TOP_PRODUCTS_LIMIT);
        stats.top_products_by_quantity = products.top_by_quantity(TOP_PRODUCTS_LIMIT);
        Ok(stats)
    }
}

fn own_items<'a>(
    order: &'a Order,
    caller: &'a Caller,
) -> impl Iterator<Item = &'a domain::OrderItem> {
    order
        .items
        .iter()
        .filter(move |item| item.seller_id == caller.user_id)
}

/// Accumulates per-product quantity and amount across orders.
#[derive(Default)]
struct ProductTally {
    entries: HashMap<ProductId, ProductStat>,
}

impl ProductTally {
    fn add(&mut self, product_id: &ProductId, name: &str, quantity: u32, amount: Money) {
        let entry = self
            .entries
            .entry(product_id.clone())
            .or_insert_with(|| ProductStat {
                product_id: product_id.clone(),
                product_name: name.to_string(),
                total_quantity: 0,
                total_amount: Money::zero(),
            });
        entry.total_quantity += quantity;
        entry.total_amount += amount;
    }

    /// Top products by amount, with quantity and then product id as
    /// tie-breaks for a stable order.
    fn top_by_amount(&self, limit: usize) -> Vec<ProductStat> {
        let mut all: Vec<ProductStat> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then(b.total_quantity.cmp(&a.total_quantity))
                .then(a.product_id.as_str().cmp(b.product_id.as_str()))
        });
        all.truncate(limit);
        all
    }

    /// Top products by units, with amount and then product id as
    /// tie-breaks.
    fn top_by_quantity(&self, limit: usize) -> Vec<ProductStat> {
        let mut all: Vec<ProductStat> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| {
            b.total_quantity
                .cmp(&a.total_quantity)
                .then(b.total_amount.cmp(&a.total_amount))
                .then(a.product_id.as_str().cmp(b.product_id.as_str()))
        });
        all.truncate(limit);
        all
    }
}
