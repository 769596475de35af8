//! Cart operations.
//!
//! Carts are created lazily on first read. Mutations validate against
//! live stock so a cart can never hold more of a product than the
//! inventory service reports, as of the time of the change.

use common::{Caller, ProductId};
use domain::{Cart, DomainError};
use store::CartStore;

use crate::error::Result;
use crate::inventory::InventoryClient;

/// Cart operations over a cart store and the inventory service.
pub struct CartService<C, I>
where
    C: CartStore,
    I: InventoryClient,
{
    carts: C,
    inventory: I,
}

impl<C, I> CartService<C, I>
where
    C: CartStore,
    I: InventoryClient,
{
    /// Creates a new cart service.
    pub fn new(carts: C, inventory: I) -> Self {
        Self { carts, inventory }
    }

    /// Returns the caller's cart, creating an empty one on first access.
    ///
    /// Cached prices and names are refreshed from live product data when
    /// the inventory service answers; when it does not, the stale caches
    /// are served as-is.
    #[tracing::instrument(skip_all, fields(user_id = %caller.user_id))]
    pub async fn get_cart(&self, caller: &Caller) -> Result<Cart> {
        let mut cart = match self.carts.find_by_user(caller.user_id).await? {
            Some(cart) => cart,
            None => Cart::new(caller.user_id),
        };

        self.refresh_caches(&mut cart).await;
        cart.mark_accessed();
        self.carts.upsert(&cart).await?;
        Ok(cart)
    }

    /// Adds a product to the caller's cart.
    ///
    /// The requested quantity plus whatever is already in the cart must
    /// not exceed live stock.
    #[tracing::instrument(skip_all, fields(user_id = %caller.user_id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        if quantity == 0 {
            return Err(DomainError::InvalidArgument {
                message: "Quantity must be at least 1".to_string(),
            }
            .into());
        }

        let product = self
            .inventory
            .fetch_product(product_id)
            .await?
            .ok_or_else(|| DomainError::ProductUnavailable {
                product_id: product_id.clone(),
            })?;

        let mut cart = match self.carts.find_by_user(caller.user_id).await? {
            Some(cart) => cart,
            None => Cart::new(caller.user_id),
        };

        let wanted = cart.quantity_of(product_id) + quantity;
        if wanted > product.stock {
            return Err(DomainError::InsufficientStock {
                product_id: product_id.clone(),
                requested: wanted,
                available: product.stock,
            }
            .into());
        }

        cart.add_item(
            product_id.clone(),
            quantity,
            product.price,
            product.name.clone(),
            product.seller_id,
        )?;
        self.carts.upsert(&cart).await?;

        metrics::counter!("cart_items_added_total").increment(1);
        Ok(cart)
    }

    /// Sets the quantity of a product already in the cart. A quantity of
    /// zero removes the line.
    #[tracing::instrument(skip_all, fields(user_id = %caller.user_id, product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let mut cart = self
            .carts
            .find_by_user(caller.user_id)
            .await?
            .ok_or(DomainError::CartNotFound {
                user_id: caller.user_id,
            })?;

        if quantity > 0 {
            let product = self
                .inventory
                .fetch_product(product_id)
                .await?
                .ok_or_else(|| DomainError::ProductUnavailable {
                    product_id: product_id.clone(),
                })?;
            if quantity > product.stock {
                return Err(DomainError::InsufficientStock {
                    product_id: product_id.clone(),
                    requested: quantity,
                    available: product.stock,
                }
                .into());
            }
        }

        if !cart.update_item_quantity(product_id, quantity) {
            return Err(DomainError::InvalidArgument {
                message: format!("Product {product_id} is not in the cart"),
            }
            .into());
        }
        self.carts.upsert(&cart).await?;
        Ok(cart)
    }

    /// Removes a product from the cart. Removing a product that is not
    /// there is a no-op.
    #[tracing::instrument(skip_all, fields(user_id = %caller.user_id, product_id = %product_id))]
    pub async fn remove_item(&self, caller: &Caller, product_id: &ProductId) -> Result<Cart> {
        let mut cart = self
            .carts
            .find_by_user(caller.user_id)
            .await?
            .ok_or(DomainError::CartNotFound {
                user_id: caller.user_id,
            })?;

        if cart.remove_item(product_id) {
            self.carts.upsert(&cart).await?;
        }
        Ok(cart)
    }

    /// Empties the caller's cart.
    #[tracing::instrument(skip_all, fields(user_id = %caller.user_id))]
    pub async fn clear_cart(&self, caller: &Caller) -> Result<Cart> {
        let mut cart = self
            .carts
            .find_by_user(caller.user_id)
            .await?
            .ok_or(DomainError::CartNotFound {
                user_id: caller.user_id,
            })?;

        cart.clear();
        self.carts.upsert(&cart).await?;
        Ok(cart)
    }

    /// Refreshes cached prices and names from live product data,
    /// skipping products the inventory service cannot answer for.
    async fn refresh_caches(&self, cart: &mut Cart) {
        let mut changed = false;
        for item in &mut cart.items {
            match self.inventory.fetch_product(&item.product_id).await {
                Ok(Some(product)) => {
                    if item.cached_price != product.price || item.cached_name != product.name {
                        item.cached_price = product.price;
                        item.cached_name = product.name;
                        changed = true;
                    }
                }
                Ok(None) => {
                    tracing::debug!(product_id = %item.product_id, "carted product no longer in catalog");
                }
                Err(e) => {
                    tracing::debug!(product_id = %item.product_id, error = %e, "cache refresh skipped");
                }
            }
        }
        if changed {
            cart.recalculate_totals();
        }
    }
}

#[cfg(test)]
mod tests {
    use common::{Money, Role, UserId};
    use store::InMemoryCartStore;

    use super::*;
    use crate::error::CheckoutError;
    use crate::inventory::{InMemoryInventoryClient, ProductSnapshot};

    fn service() -> (
        CartService<InMemoryCartStore, InMemoryInventoryClient>,
        InMemoryCartStore,
        InMemoryInventoryClient,
    ) {
        let carts = InMemoryCartStore::new();
        let inventory = InMemoryInventoryClient::new();
        (
            CartService::new(carts.clone(), inventory.clone()),
            carts,
            inventory,
        )
    }

    fn caller() -> Caller {
        Caller::new(UserId::new(), "buyer@example.com", Role::Client)
    }

    fn product(id: &str, price_cents: i64, stock: u32) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: "desc".to_string(),
            price: Money::from_cents(price_cents),
            stock,
            seller_id: UserId::new(),
            seller_name: "Widget Shop".to_string(),
            media_ids: vec![],
        }
    }

    #[tokio::test]
    async fn test_get_cart_creates_lazily_and_persists() {
        let (service, carts, _) = service();
        let caller = caller();

        let cart = service.get_cart(&caller).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.user_id, caller.user_id);

        let stored = carts.find_by_user(caller.user_id).await.unwrap().unwrap();
        assert_eq!(stored.id, cart.id);

        // a second read returns the same cart
        let again = service.get_cart(&caller).await.unwrap();
        assert_eq!(again.id, cart.id);
    }

    #[tokio::test]
    async fn test_add_item_caches_live_price() {
        let (service, _, inventory) = service();
        let caller = caller();
        inventory.put_product(product("prod-1", 1000, 5));

        let cart = service
            .add_item(&caller, &ProductId::new("prod-1"), 2)
            .await
            .unwrap();

        assert_eq!(cart.total_items, 2);
        assert_eq!(cart.items[0].cached_price.cents(), 1000);
        assert_eq!(cart.cached_subtotal.cents(), 2000);
    }

    #[tokio::test]
    async fn test_add_item_caps_at_live_stock_including_carted_quantity() {
        let (service, _, inventory) = service();
        let caller = caller();
        inventory.put_product(product("prod-1", 1000, 3));

        service
            .add_item(&caller, &ProductId::new("prod-1"), 2)
            .await
            .unwrap();

        // 2 already carted, stock is 3, so 2 more must fail
        let err = service
            .add_item(&caller, &ProductId::new("prod-1"), 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Domain(DomainError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_add_unknown_product_fails() {
        let (service, _, _) = service();
        let err = service
            .add_item(&caller(), &ProductId::new("prod-missing"), 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Domain(DomainError::ProductUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_quantity_checks_stock_and_zero_removes() {
        let (service, _, inventory) = service();
        let caller = caller();
        inventory.put_product(product("prod-1", 1000, 5));
        service
            .add_item(&caller, &ProductId::new("prod-1"), 1)
            .await
            .unwrap();

        let err = service
            .update_quantity(&caller, &ProductId::new("prod-1"), 9)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Domain(DomainError::InsufficientStock { .. })
        ));

        let cart = service
            .update_quantity(&caller, &ProductId::new("prod-1"), 4)
            .await
            .unwrap();
        assert_eq!(cart.total_items, 4);

        let cart = service
            .update_quantity(&caller, &ProductId::new("prod-1"), 0)
            .await
            .unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_without_cart_is_not_found() {
        let (service, _, inventory) = service();
        inventory.put_product(product("prod-1", 1000, 5));

        let err = service
            .update_quantity(&caller(), &ProductId::new("prod-1"), 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Domain(DomainError::CartNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_item_is_idempotent() {
        let (service, _, inventory) = service();
        let caller = caller();
        inventory.put_product(product("prod-1", 1000, 5));
        service
            .add_item(&caller, &ProductId::new("prod-1"), 1)
            .await
            .unwrap();

        let cart = service
            .remove_item(&caller, &ProductId::new("prod-1"))
            .await
            .unwrap();
        assert!(cart.is_empty());

        let cart = service
            .remove_item(&caller, &ProductId::new("prod-1"))
            .await
            .unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_get_cart_refreshes_cached_prices() {
        let (service, _, inventory) = service();
        let caller = caller();
        inventory.put_product(product("prod-1", 1000, 5));
        service
            .add_item(&caller, &ProductId::new("prod-1"), 2)
            .await
            .unwrap();

        inventory.put_product(product("prod-1", 1200, 5));

        let cart = service.get_cart(&caller).await.unwrap();
        assert_eq!(cart.items[0].cached_price.cents(), 1200);
        assert_eq!(cart.cached_subtotal.cents(), 2400);
    }

    #[tokio::test]
    async fn test_get_cart_serves_stale_caches_during_outage() {
        let (service, _, inventory) = service();
        let caller = caller();
        inventory.put_product(product("prod-1", 1000, 5));
        service
            .add_item(&caller, &ProductId::new("prod-1"), 2)
            .await
            .unwrap();

        inventory.set_fail_on_fetch(true);

        let cart = service.get_cart(&caller).await.unwrap();
        assert_eq!(cart.items[0].cached_price.cents(), 1000);
        assert_eq!(cart.cached_subtotal.cents(), 2000);
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let (service, _, inventory) = service();
        let caller = caller();
        inventory.put_product(product("prod-1", 1000, 5));
        service
            .add_item(&caller, &ProductId::new("prod-1"), 2)
            .await
            .unwrap();

        let cart = service.clear_cart(&caller).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items, 0);
        assert!(cart.cached_subtotal.is_zero());
    }
}
