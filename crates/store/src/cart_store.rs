use async_trait::async_trait;
use common::UserId;
use domain::Cart;

use crate::Result;

/// Core trait for cart persistence.
///
/// Each user has at most one cart; implementations enforce the
/// uniqueness.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Retrieves the cart for `user_id`. Returns None if the user has
    /// never had one.
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts or replaces the cart for `cart.user_id`.
    async fn upsert(&self, cart: &Cart) -> Result<()>;

    /// Deletes the cart for `user_id`. Returns true if one existed.
    async fn delete_for_user(&self, user_id: UserId) -> Result<bool>;
}
