//! Domain layer for the order/cart subsystem.
//!
//! This crate provides the core aggregates and rules:
//! - Cart aggregate with denormalized totals
//! - Order aggregate with snapshot items and an append-only status history
//! - Order status state machine
//! - Authorization guard for every order mutation
//!
//! Nothing here performs I/O; storage and the inventory service live in
//! sibling crates.

pub mod auth;
pub mod cart;
pub mod error;
pub mod order;

pub use cart::{Cart, CartItem, CartStatus};
pub use error::DomainError;
pub use order::{
    Order, OrderDraft, OrderItem, OrderStatus, PaymentStatus, ShippingAddress, StatusChange,
};
