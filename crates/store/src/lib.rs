//! Persistence for orders and carts.
//!
//! Aggregates are stored as whole documents. Each trait has two
//! implementations: an in-memory one for tests and a PostgreSQL one for
//! production. The [`OrderStore::update_if_status`] compare-and-swap is
//! how concurrent status changes are serialized; there is no locking.

pub mod cart_store;
pub mod error;
pub mod memory;
pub mod order_store;
pub mod postgres;

pub use cart_store::CartStore;
pub use error::{Result, StoreError};
pub use memory::{InMemoryCartStore, InMemoryOrderStore};
pub use order_store::{OrderStore, Page};
pub use postgres::{PostgresCartStore, PostgresOrderStore};
