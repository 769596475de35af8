//! Profile statistics read models.

use common::{Money, ProductId};
use serde::Serialize;

/// How often one product appears across a set of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductStat {
    pub product_id: ProductId,
    pub product_name: String,
    pub total_quantity: u32,
    pub total_amount: Money,
}

/// Statistics over a buyer's order history.
#[derive(Debug, Clone, Serialize)]
pub struct BuyerStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,

    /// Everything spent on delivered or confirmed orders. Orders still
    /// in flight do not count yet.
    pub total_spent: Money,

    /// `total_spent` divided by the number of delivered or confirmed
    /// orders.
    pub average_order_value: Money,

    /// Most purchased products by amount spent, at most five.
    pub top_products_by_amount: Vec<ProductStat>,

    /// Most purchased products by units bought, at most five.
    pub top_products_by_quantity: Vec<ProductStat>,
}

/// Statistics over the orders containing a seller's items.
#[derive(Debug, Clone, Serialize)]
pub struct SellerStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,

    /// Earnings over this seller's own items in delivered or confirmed
    /// orders only. Other sellers' items in the same orders do not
    /// count.
    pub total_earnings: Money,

    /// Units of this seller's items in delivered or confirmed orders.
    pub total_products_sold: u64,

    /// This seller's best-selling products by amount, at most five.
    pub top_products_by_amount: Vec<ProductStat>,

    /// This seller's best-selling products by units, at most five.
    pub top_products_by_quantity: Vec<ProductStat>,
}
