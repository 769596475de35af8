//! Order aggregate: snapshot items, status state machine, append-only
//! status history, and soft delete.

mod aggregate;
mod status;
mod value_objects;

pub use aggregate::{Order, OrderDraft};
pub use status::OrderStatus;
pub use value_objects::{OrderItem, PaymentStatus, ShippingAddress, StatusChange};
