//! Shared types for the order/cart subsystem.
//!
//! Newtype identifiers keep user, order, and cart ids from being mixed up,
//! and [`Money`] keeps all amounts in integer cents.

pub mod identity;
pub mod ids;
pub mod money;

pub use identity::{Caller, Role};
pub use ids::{CartId, OrderId, ProductId, UserId};
pub use money::Money;
