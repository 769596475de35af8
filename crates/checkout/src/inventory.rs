//! Inventory client trait and in-memory implementation.
//!
//! The inventory service owns product data and live stock. Checkout
//! validates against it and reports stock adjustments back to it; the
//! HTTP implementation lives in [`crate::http`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the inventory service.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The service could not be reached or answered with a server error.
    #[error("Inventory service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a body this client cannot interpret.
    #[error("Malformed inventory response: {0}")]
    MalformedResponse(String),

    /// The request did not complete within the client timeout.
    #[error("Inventory request timed out")]
    Timeout,
}

/// Live product data as reported by the inventory service.
///
/// This is what gets snapshotted into order items at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub seller_id: UserId,
    pub seller_name: String,
    pub media_ids: Vec<String>,
}

impl ProductSnapshot {
    /// First media id, used for order item thumbnails.
    pub fn thumbnail(&self) -> Option<String> {
        self.media_ids.first().cloned()
    }
}

/// One product's stock delta in an adjustment batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Outcome of one product's adjustment within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItemOutcome {
    pub product_id: ProductId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StockItemOutcome {
    fn applied(product_id: ProductId, previous_stock: u32, new_stock: u32) -> Self {
        Self {
            product_id,
            success: true,
            previous_stock: Some(previous_stock),
            new_stock: Some(new_stock),
            error: None,
        }
    }

    fn rejected(product_id: ProductId, error: impl Into<String>) -> Self {
        Self {
            product_id,
            success: false,
            previous_stock: None,
            new_stock: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a whole adjustment batch. Items are applied independently;
/// `success` is true only when every item succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockBatchOutcome {
    pub success: bool,
    pub per_item: Vec<StockItemOutcome>,
}

impl StockBatchOutcome {
    /// Builds a batch outcome, deriving `success` from the items.
    pub fn from_items(per_item: Vec<StockItemOutcome>) -> Self {
        let success = per_item.iter().all(|i| i.success);
        Self { success, per_item }
    }

    /// Items that were not applied.
    pub fn failures(&self) -> impl Iterator<Item = &StockItemOutcome> {
        self.per_item.iter().filter(|i| !i.success)
    }
}

/// Trait for inventory operations used by checkout.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Fetches live data for a product. Returns None when the product
    /// does not exist.
    async fn fetch_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<ProductSnapshot>, InventoryError>;

    /// Decrements stock for the given products. Called after an order is
    /// persisted. The error covers transport failures only; individual
    /// rejections come back inside the outcome.
    async fn decrement_stock(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<StockBatchOutcome, InventoryError>;

    /// Increments stock for the given products. Called after a
    /// cancellation is persisted.
    async fn increment_stock(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<StockBatchOutcome, InventoryError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: HashMap<ProductId, ProductSnapshot>,
    fail_on_fetch: bool,
    fail_on_adjust: bool,
}

/// In-memory inventory client for testing.
///
/// Stock adjustments apply to the held products, so tests can assert
/// stock levels after checkout and cancellation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryClient {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryClient {
    /// Creates a new in-memory inventory client with no products.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn put_product(&self, product: ProductSnapshot) {
        let mut state = self.state.write().unwrap();
        state.products.insert(product.id.clone(), product);
    }

    /// Returns the current stock of a product, if it exists.
    pub fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        let state = self.state.read().unwrap();
        state.products.get(product_id).map(|p| p.stock)
    }

    /// Configures fetches to fail with [`InventoryError::Unavailable`].
    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.state.write().unwrap().fail_on_fetch = fail;
    }

    /// Configures stock adjustments to fail with
    /// [`InventoryError::Unavailable`].
    pub fn set_fail_on_adjust(&self, fail: bool) {
        self.state.write().unwrap().fail_on_adjust = fail;
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn fetch_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<ProductSnapshot>, InventoryError> {
        let state = self.state.read().unwrap();
        if state.fail_on_fetch {
            return Err(InventoryError::Unavailable("simulated outage".to_string()));
        }
        Ok(state.products.get(product_id).cloned())
    }

    async fn decrement_stock(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<StockBatchOutcome, InventoryError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_adjust {
            return Err(InventoryError::Unavailable("simulated outage".to_string()));
        }
        let per_item = adjustments
            .iter()
            .map(|adjustment| match state.products.get_mut(&adjustment.product_id) {
                Some(product) if product.stock >= adjustment.quantity => {
                    let previous = product.stock;
                    product.stock -= adjustment.quantity;
                    StockItemOutcome::applied(adjustment.product_id.clone(), previous, product.stock)
                }
                Some(_) => {
                    StockItemOutcome::rejected(adjustment.product_id.clone(), "insufficient stock")
                }
                None => {
                    StockItemOutcome::rejected(adjustment.product_id.clone(), "product not found")
                }
            })
            .collect();
        Ok(StockBatchOutcome::from_items(per_item))
    }

    async fn increment_stock(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<StockBatchOutcome, InventoryError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_adjust {
            return Err(InventoryError::Unavailable("simulated outage".to_string()));
        }
        let per_item = adjustments
            .iter()
            .map(|adjustment| match state.products.get_mut(&adjustment.product_id) {
                Some(product) => {
                    let previous = product.stock;
                    product.stock += adjustment.quantity;
                    StockItemOutcome::applied(adjustment.product_id.clone(), previous, product.stock)
                }
                None => {
                    StockItemOutcome::rejected(adjustment.product_id.clone(), "product not found")
                }
            })
            .collect();
        Ok(StockBatchOutcome::from_items(per_item))
    }
}
