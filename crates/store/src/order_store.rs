use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Order, OrderStatus};

use crate::Result;

/// Offset/limit pagination for order listings.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// A page large enough to hold any realistic result set.
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: u64::MAX,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// Core trait for order persistence.
///
/// Orders are stored as whole documents; implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order.
    ///
    /// Fails with [`StoreError::DuplicateOrderNumber`] if the order number
    /// is already taken.
    ///
    /// [`StoreError::DuplicateOrderNumber`]: crate::StoreError::DuplicateOrderNumber
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Replaces a stored order with `order`, matched by id.
    async fn update(&self, order: &Order) -> Result<()>;

    /// Replaces a stored order only if its current status is `expected`.
    ///
    /// Returns false when the stored status differs, which means another
    /// writer got there first. Nothing is written in that case.
    async fn update_if_status(&self, order: &Order, expected: OrderStatus) -> Result<bool>;

    /// Retrieves an order by id. Returns None if it does not exist.
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Lists a buyer's orders, newest first, excluding soft-deleted ones.
    async fn list_for_buyer(&self, buyer_id: UserId, page: Page) -> Result<Vec<Order>>;

    /// Lists orders containing items sold by `seller_id`, newest first,
    /// optionally filtered by status, excluding soft-deleted ones.
    async fn list_for_seller(
        &self,
        seller_id: UserId,
        status: Option<OrderStatus>,
        page: Page,
    ) -> Result<Vec<Order>>;

    /// Lists orders containing items sold by `seller_id` whose order
    /// number or buyer email contains `keyword`, case-insensitively,
    /// newest first, excluding soft-deleted ones.
    async fn search_for_seller(
        &self,
        seller_id: UserId,
        keyword: &str,
        page: Page,
    ) -> Result<Vec<Order>>;
}
