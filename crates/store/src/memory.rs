use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Cart, Order, OrderStatus};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    cart_store::CartStore,
    order_store::{OrderStore, Page},
};

fn page_slice(orders: &mut Vec<Order>, page: Page) {
    // newest first
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    *orders = orders
        .iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();
}

/// In-memory order store for testing.
///
/// Provides the same interface and constraints as the PostgreSQL
/// implementation, including order number uniqueness.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored orders, removed ones included.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber {
                order_number: order.order_number.clone(),
            });
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_if_status(&self, order: &Order, expected: OrderStatus) -> Result<bool> {
        let mut orders = self.orders.write().await;
        match orders.get(&order.id) {
            Some(stored) if stored.status == expected => {
                orders.insert(order.id, order.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn list_for_buyer(&self, buyer_id: UserId, page: Page) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matches: Vec<Order> = orders
            .values()
            .filter(|o| o.buyer_id == buyer_id && !o.is_removed)
            .cloned()
            .collect();
        page_slice(&mut matches, page);
        Ok(matches)
    }

    async fn list_for_seller(
        &self,
        seller_id: UserId,
        status: Option<OrderStatus>,
        page: Page,
    ) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matches: Vec<Order> = orders
            .values()
            .filter(|o| o.involves_seller(seller_id) && !o.is_removed)
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        page_slice(&mut matches, page);
        Ok(matches)
    }

    async fn search_for_seller(
        &self,
        seller_id: UserId,
        keyword: &str,
        page: Page,
    ) -> Result<Vec<Order>> {
        let keyword = keyword.to_lowercase();
        let orders = self.orders.read().await;
        let mut matches: Vec<Order> = orders
            .values()
            .filter(|o| o.involves_seller(seller_id) && !o.is_removed)
            .filter(|o| {
                o.order_number.to_lowercase().contains(&keyword)
                    || o.buyer_email.to_lowercase().contains(&keyword)
            })
            .cloned()
            .collect();
        page_slice(&mut matches, page);
        Ok(matches)
    }
}

/// In-memory cart store for testing.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
}

impl InMemoryCartStore {
    /// Creates a new empty in-memory cart store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn upsert(&self, cart: &Cart) -> Result<()> {
        self.carts.write().await.insert(cart.user_id, cart.clone());
        Ok(())
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<bool> {
        Ok(self.carts.write().await.remove(&user_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use common::{Money, Role};
    use domain::{OrderDraft, OrderItem, ShippingAddress};

    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Jane Doe".to_string(),
            address_line1: "1 Harbour Rd".to_string(),
            address_line2: None,
            city: "Mariehamn".to_string(),
            postal_code: "22100".to_string(),
            country: "Finland".to_string(),
            phone_number: None,
        }
    }

    fn make_order(buyer: UserId, seller: UserId) -> Order {
        Order::create(OrderDraft {
            buyer_id: buyer,
            buyer_name: "Jane Doe".to_string(),
            buyer_email: "jane@example.com".to_string(),
            items: vec![OrderItem::new(
                "prod-1",
                "Widget",
                "A widget",
                Money::from_cents(1000),
                1,
                seller,
                "Widget Shop",
                None,
            )],
            shipping_address: address(),
            delivery_notes: None,
            payment_method: None,
            original_order_id: None,
            creation_reason: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryOrderStore::new();
        let order = make_order(UserId::new(), UserId::new());

        store.insert(&order).await.unwrap();
        let found = store.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(found, order);

        assert!(store.find_by_id(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_order_number() {
        let store = InMemoryOrderStore::new();
        let order = make_order(UserId::new(), UserId::new());
        let mut clash = make_order(UserId::new(), UserId::new());
        clash.order_number = order.order_number.clone();

        store.insert(&order).await.unwrap();
        let err = store.insert(&clash).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOrderNumber { .. }));
    }

    #[tokio::test]
    async fn test_update_if_status_detects_lost_race() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let seller = UserId::new();
        let order = make_order(buyer, seller);
        store.insert(&order).await.unwrap();

        // another writer confirms the order
        let mut confirmed = order.clone();
        confirmed
            .transition(OrderStatus::Confirmed, seller, Role::Seller, "Confirmed")
            .unwrap();
        assert!(store
            .update_if_status(&confirmed, OrderStatus::Pending)
            .await
            .unwrap());

        // our stale cancel must not apply
        let mut cancelled = order.clone();
        cancelled
            .transition(OrderStatus::Cancelled, buyer, Role::Client, "changed my mind")
            .unwrap();
        assert!(!store
            .update_if_status(&cancelled, OrderStatus::Pending)
            .await
            .unwrap());

        let stored = store.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_buyer_listing_excludes_removed_and_paginates() {
        let store = InMemoryOrderStore::new();
        let buyer = UserId::new();
        let seller = UserId::new();

        let mut removed = make_order(buyer, seller);
        removed
            .transition(OrderStatus::Cancelled, buyer, Role::Client, "changed my mind")
            .unwrap();
        removed.mark_removed(buyer).unwrap();
        store.insert(&removed).await.unwrap();

        for _ in 0..3 {
            store.insert(&make_order(buyer, seller)).await.unwrap();
        }
        store
            .insert(&make_order(UserId::new(), seller))
            .await
            .unwrap();

        let all = store.list_for_buyer(buyer, Page::all()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|o| !o.is_removed));

        let page = store.list_for_buyer(buyer, Page::new(1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_seller_listing_filters_by_status() {
        let store = InMemoryOrderStore::new();
        let seller = UserId::new();
        let buyer = UserId::new();

        let pending = make_order(buyer, seller);
        store.insert(&pending).await.unwrap();

        let mut confirmed = make_order(buyer, seller);
        confirmed
            .transition(OrderStatus::Confirmed, seller, Role::Seller, "Confirmed")
            .unwrap();
        store.insert(&confirmed).await.unwrap();

        store
            .insert(&make_order(buyer, UserId::new()))
            .await
            .unwrap();

        let all = store
            .list_for_seller(seller, None, Page::all())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let only_confirmed = store
            .list_for_seller(seller, Some(OrderStatus::Confirmed), Page::all())
            .await
            .unwrap();
        assert_eq!(only_confirmed.len(), 1);
        assert_eq!(only_confirmed[0].id, confirmed.id);
    }

    #[tokio::test]
    async fn test_seller_listing_excludes_removed() {
        let store = InMemoryOrderStore::new();
        let seller = UserId::new();
        let buyer = UserId::new();

        let mut removed = make_order(buyer, seller);
        removed
            .transition(OrderStatus::Cancelled, buyer, Role::Client, "changed my mind")
            .unwrap();
        removed.mark_removed(buyer).unwrap();
        store.insert(&removed).await.unwrap();

        let all = store
            .list_for_seller(seller, None, Page::all())
            .await
            .unwrap();
        assert!(all.is_empty());

        let cancelled = store
            .list_for_seller(seller, Some(OrderStatus::Cancelled), Page::all())
            .await
            .unwrap();
        assert!(cancelled.is_empty());
    }

    #[tokio::test]
    async fn test_seller_search_matches_number_and_email() {
        let store = InMemoryOrderStore::new();
        let seller = UserId::new();
        let buyer = UserId::new();

        let order = make_order(buyer, seller);
        store.insert(&order).await.unwrap();
        store
            .insert(&make_order(buyer, UserId::new()))
            .await
            .unwrap();

        // unique suffix of the order number, mixed case
        let suffix = order.order_number[order.order_number.len() - 5..].to_lowercase();
        let by_number = store
            .search_for_seller(seller, &suffix, Page::all())
            .await
            .unwrap();
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].id, order.id);

        let by_email = store
            .search_for_seller(seller, "JANE@", Page::all())
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);

        let none = store
            .search_for_seller(seller, "nobody@else.test", Page::all())
            .await
            .unwrap();
        assert!(none.is_empty());

        // removed orders never surface in search results
        let mut removed = make_order(buyer, seller);
        removed
            .transition(OrderStatus::Cancelled, buyer, Role::Client, "changed my mind")
            .unwrap();
        removed.mark_removed(buyer).unwrap();
        store.insert(&removed).await.unwrap();
        let after_removal = store
            .search_for_seller(seller, "jane@", Page::all())
            .await
            .unwrap();
        assert_eq!(after_removal.len(), 1);
    }

    #[tokio::test]
    async fn test_cart_store_roundtrip() {
        let store = InMemoryCartStore::new();
        let user = UserId::new();

        assert!(store.find_by_user(user).await.unwrap().is_none());

        let mut cart = Cart::new(user);
        cart.add_item("prod-1", 2, Money::from_cents(500), "Widget", UserId::new())
            .unwrap();
        store.upsert(&cart).await.unwrap();

        let found = store.find_by_user(user).await.unwrap().unwrap();
        assert_eq!(found, cart);

        assert!(store.delete_for_user(user).await.unwrap());
        assert!(!store.delete_for_user(user).await.unwrap());
        assert!(store.find_by_user(user).await.unwrap().is_none());
    }
}
