//! Cart aggregate.
//!
//! Each user has at most one cart; the store enforces the uniqueness. The
//! cart caches product price and name for display, but those caches are
//! advisory only: checkout always re-reads live product data.

use chrono::{DateTime, Utc};
use common::{CartId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle status of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartStatus {
    /// The user is still shopping.
    #[default]
    Active,
    /// The cart was converted into an order.
    Purchased,
    /// The cart went stale without a purchase.
    Abandoned,
    /// The cart was merged into another cart at login.
    Merged,
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,

    pub quantity: u32,

    /// Price at the time the item was added or last refreshed. Display
    /// only; never used for charging.
    pub cached_price: Money,

    /// Product name at the time the item was added or last refreshed.
    pub cached_name: String,

    pub seller_id: UserId,

    /// Line subtotal from the cached price.
    pub cached_subtotal: Money,

    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(
        product_id: impl Into<ProductId>,
        quantity: u32,
        cached_price: Money,
        cached_name: impl Into<String>,
        seller_id: UserId,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            cached_price,
            cached_name: cached_name.into(),
            seller_id,
            cached_subtotal: cached_price.multiply(quantity),
            added_at: Utc::now(),
        }
    }
}

/// A user's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub status: CartStatus,

    /// Sum of all line quantities, kept in step with `items`.
    pub total_items: u32,

    /// Sum of all cached line subtotals, kept in step with `items`.
    pub cached_subtotal: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty active cart for `user_id`.
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            user_id,
            items: Vec::new(),
            status: CartStatus::Active,
            total_items: 0,
            cached_subtotal: Money::zero(),
            created_at: now,
            updated_at: now,
            last_accessed_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the line for `product_id`, if present.
    pub fn find_item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Returns the quantity of `product_id` currently in the cart.
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.find_item(product_id).map_or(0, |i| i.quantity)
    }

    /// Adds `quantity` of a product, merging with an existing line for the
    /// same product. Rejects a zero quantity.
    pub fn add_item(
        &mut self,
        product_id: impl Into<ProductId>,
        quantity: u32,
        price: Money,
        name: impl Into<String>,
        seller_id: UserId,
    ) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidArgument {
                message: "Quantity must be at least 1".to_string(),
            });
        }
        let product_id = product_id.into();
        let name = name.into();
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(line) => {
                line.quantity += quantity;
                line.cached_price = price;
                line.cached_name = name;
            }
            None => {
                self.items
                    .push(CartItem::new(product_id, quantity, price, name, seller_id));
            }
        }
        self.recalculate_totals();
        Ok(())
    }

    /// Sets the quantity of an existing line. A quantity of zero removes
    /// the line.
    ///
    /// Returns true if the line existed.
    pub fn update_item_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        let Some(pos) = self.items.iter().position(|i| &i.product_id == product_id) else {
            return false;
        };
        if quantity == 0 {
            self.items.remove(pos);
        } else {
            self.items[pos].quantity = quantity;
        }
        self.recalculate_totals();
        true
    }

    /// Removes the line for `product_id`. Returns true if it existed.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.recalculate_totals();
        }
        removed
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate_totals();
    }

    /// Recomputes cached subtotals and totals from the items.
    pub fn recalculate_totals(&mut self) {
        for item in &mut self.items {
            item.cached_subtotal = item.cached_price.multiply(item.quantity);
        }
        self.cached_subtotal = self.items.iter().map(|i| i.cached_subtotal).sum();
        self.total_items = self.items.iter().map(|i| i.quantity).sum();
        self.updated_at = Utc::now();
    }

    /// Records a read of the cart, for staleness tracking.
    pub fn mark_accessed(&mut self) {
        self.last_accessed_at = Utc::now();
    }

    /// Marks the cart as converted into an order and empties it.
    pub fn mark_purchased(&mut self) {
        self.status = CartStatus::Purchased;
        self.clear();
    }
}
