//! Checkout and cart orchestration.
//!
//! Ties the domain aggregates to persistence and the inventory service:
//! cart mutations validate against live stock, checkout snapshots live
//! product data into an order, and lifecycle operations (cancel, redo,
//! remove, status updates) enforce authorization and the status state
//! machine. Stock adjustments after a persisted write are best-effort
//! and never undo the write.

pub mod cart_service;
pub mod error;
pub mod http;
pub mod inventory;
pub mod orchestrator;

pub use cart_service::CartService;
pub use error::{CheckoutError, Result};
pub use http::HttpInventoryClient;
pub use inventory::{
    InMemoryInventoryClient, InventoryClient, InventoryError, ProductSnapshot, StockAdjustment,
    StockBatchOutcome, StockItemOutcome,
};
pub use orchestrator::CheckoutOrchestrator;
