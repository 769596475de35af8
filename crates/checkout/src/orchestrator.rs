//! Checkout orchestrator.
//!
//! Drives the order lifecycle: checkout from a cart, cancellation, redo,
//! soft delete, and seller status updates. Every mutation validates
//! authorization and state first, persists the order, and only then
//! reports stock adjustments to the inventory service. Stock adjustment
//! is best-effort: a failure there is logged and never rolls back an
//! already-persisted order.

use common::{Caller, OrderId};
use domain::{DomainError, Order, OrderDraft, OrderItem, OrderStatus, ShippingAddress, auth};
use store::{CartStore, OrderStore, Page, StoreError};

use crate::error::{CheckoutError, Result};
use crate::inventory::{InventoryClient, ProductSnapshot, StockAdjustment};

/// Minimum length of a trimmed cancellation reason.
const MIN_CANCEL_REASON_LEN: usize = 5;

/// Orchestrates order operations over an order store, a cart store, and
/// the inventory service.
pub struct CheckoutOrchestrator<O, C, I>
where
    O: OrderStore,
    C: CartStore,
    I: InventoryClient,
{
    orders: O,
    carts: C,
    inventory: I,
}

impl<O, C, I> CheckoutOrchestrator<O, C, I>
where
    O: OrderStore,
    C: CartStore,
    I: InventoryClient,
{
    /// Creates a new orchestrator.
    pub fn new(orders: O, carts: C, inventory: I) -> Self {
        Self {
            orders,
            carts,
            inventory,
        }
    }

    /// Converts the caller's cart into an order.
    ///
    /// Validates every cart line against live product data first; any
    /// unavailable product or stock shortfall fails the whole checkout
    /// and nothing is written. On success the order starts in `Pending`,
    /// the cart is emptied, and stock decrements are reported
    /// best-effort.
    #[tracing::instrument(skip_all, fields(user_id = %caller.user_id))]
    pub async fn checkout(
        &self,
        caller: &Caller,
        shipping_address: ShippingAddress,
        delivery_notes: Option<String>,
        payment_method: Option<String>,
    ) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        validate_shipping_address(&shipping_address)?;

        let cart = self
            .carts
            .find_by_user(caller.user_id)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or(DomainError::EmptyCart)?;

        // Validate all lines against live stock before touching anything.
        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = self.fetch_available(&line.product_id).await?;
            if product.stock < line.quantity {
                return Err(DomainError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                    available: product.stock,
                }
                .into());
            }
            items.push(snapshot_item(&product, line.quantity));
        }

        let order = Order::create(OrderDraft {
            buyer_id: caller.user_id,
            buyer_name: caller.display_name().to_string(),
            buyer_email: caller.email.clone(),
            items,
            shipping_address,
            delivery_notes,
            payment_method,
            original_order_id: None,
            creation_reason: None,
        })?;
        let order = self.insert_with_number_retry(order).await?;

        let mut cart = cart;
        cart.mark_purchased();
        self.carts.upsert(&cart).await?;

        self.adjust_stock_best_effort(&order, Adjust::Decrement).await;

        metrics::counter!("checkout_orders_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, order_number = %order.order_number, "order placed");
        Ok(order)
    }

    /// Cancels an order that has not shipped yet.
    ///
    /// Only the buyer may cancel, a trimmed reason of at least five
    /// characters is required, and the write is a compare-and-swap on
    /// the status the caller saw. Stock is restored best-effort.
    #[tracing::instrument(skip_all, fields(order_id = %order_id, user_id = %caller.user_id))]
    pub async fn cancel_order(
        &self,
        caller: &Caller,
        order_id: OrderId,
        reason: &str,
    ) -> Result<Order> {
        let reason = reason.trim();
        if reason.len() < MIN_CANCEL_REASON_LEN {
            return Err(DomainError::InvalidArgument {
                message: format!(
                    "Cancellation reason must be at least {MIN_CANCEL_REASON_LEN} characters"
                ),
            }
            .into());
        }

        let mut order = self.load_order(order_id).await?;
        auth::require_buyer(caller, &order)?;
        auth::require_cancellable(&order)?;

        let expected = order.status;
        order.transition(OrderStatus::Cancelled, caller.user_id, caller.role, reason)?;

        if !self.orders.update_if_status(&order, expected).await? {
            return Err(CheckoutError::Conflict {
                message: format!("order {order_id} changed status during cancellation"),
            });
        }

        self.adjust_stock_best_effort(&order, Adjust::Increment).await;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_number = %order.order_number, "order cancelled");
        Ok(order)
    }

    /// Creates a fresh order from a cancelled one.
    ///
    /// Every item is re-validated against live product data and priced
    /// at today's prices, not the original ones. The new order records
    /// the cancelled order it came from.
    #[tracing::instrument(skip_all, fields(order_id = %order_id, user_id = %caller.user_id))]
    pub async fn redo_order(&self, caller: &Caller, order_id: OrderId) -> Result<Order> {
        let original = self.load_order(order_id).await?;
        auth::require_buyer(caller, &original)?;
        auth::require_redo_eligible(&original)?;

        let mut items = Vec::with_capacity(original.items.len());
        for line in &original.items {
            let product = self.fetch_available(&line.product_id).await?;
            if product.stock < line.quantity {
                return Err(DomainError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                    available: product.stock,
                }
                .into());
            }
            items.push(snapshot_item(&product, line.quantity));
        }

        let order = Order::create(OrderDraft {
            buyer_id: caller.user_id,
            buyer_name: caller.display_name().to_string(),
            buyer_email: caller.email.clone(),
            items,
            shipping_address: original.shipping_address.clone(),
            delivery_notes: original.delivery_notes.clone(),
            payment_method: original.payment_method.clone(),
            original_order_id: Some(original.id),
            creation_reason: Some(format!(
                "Order created as redo of {}",
                original.order_number
            )),
        })?;
        let order = self.insert_with_number_retry(order).await?;

        self.adjust_stock_best_effort(&order, Adjust::Decrement).await;

        metrics::counter!("orders_redone_total").increment(1);
        tracing::info!(order_number = %order.order_number, "order redone");
        Ok(order)
    }

    /// Soft-deletes a finished order from the buyer's history.
    #[tracing::instrument(skip_all, fields(order_id = %order_id, user_id = %caller.user_id))]
    pub async fn remove_order(&self, caller: &Caller, order_id: OrderId) -> Result<()> {
        let mut order = self.load_order(order_id).await?;
        auth::require_buyer(caller, &order)?;
        order.mark_removed(caller.user_id)?;
        self.orders.update(&order).await?;
        tracing::info!(order_number = %order.order_number, "order removed from history");
        Ok(())
    }

    /// Moves an order along its lifecycle.
    ///
    /// Every fulfilment transition is seller-only and restricted to
    /// sellers with items in the order. Cancellation has its own
    /// operation with stricter rules and is rejected here.
    #[tracing::instrument(skip_all, fields(order_id = %order_id, user_id = %caller.user_id, target = %target))]
    pub async fn update_status(
        &self,
        caller: &Caller,
        order_id: OrderId,
        target: OrderStatus,
        reason: Option<String>,
    ) -> Result<Order> {
        if target == OrderStatus::Cancelled {
            return Err(DomainError::InvalidArgument {
                message: "Use the cancel operation to cancel an order".to_string(),
            }
            .into());
        }

        let mut order = self.load_order(order_id).await?;
        auth::require_seller_in_order(caller, &order)?;

        let expected = order.status;
        let reason = reason.unwrap_or_else(|| format!("Status changed to {target}"));
        order.transition(target, caller.user_id, caller.role, reason)?;

        if !self.orders.update_if_status(&order, expected).await? {
            return Err(CheckoutError::Conflict {
                message: format!("order {order_id} changed status concurrently"),
            });
        }

        tracing::info!(order_number = %order.order_number, status = %order.status, "order status updated");
        Ok(order)
    }

    /// Retrieves an order for the buyer or an involved seller.
    pub async fn get_order(&self, caller: &Caller, order_id: OrderId) -> Result<Order> {
        let order = self.load_order(order_id).await?;
        auth::require_order_access(caller, &order)?;
        Ok(order)
    }

    /// Lists the caller's orders, newest first, without removed ones.
    pub async fn list_buyer_orders(&self, caller: &Caller, page: Page) -> Result<Vec<Order>> {
        Ok(self.orders.list_for_buyer(caller.user_id, page).await?)
    }

    /// Lists orders containing the calling seller's items.
    pub async fn list_seller_orders(
        &self,
        caller: &Caller,
        status: Option<OrderStatus>,
        page: Page,
    ) -> Result<Vec<Order>> {
        if !caller.is_seller() {
            return Err(DomainError::Forbidden {
                reason: "only sellers may list their sales",
            }
            .into());
        }
        Ok(self
            .orders
            .list_for_seller(caller.user_id, status, page)
            .await?)
    }

    /// Searches the calling seller's orders by order number or buyer
    /// email. Blank keywords match nothing rather than everything.
    pub async fn search_seller_orders(
        &self,
        caller: &Caller,
        keyword: &str,
        page: Page,
    ) -> Result<Vec<Order>> {
        if !caller.is_seller() {
            return Err(DomainError::Forbidden {
                reason: "only sellers may search their sales",
            }
            .into());
        }
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .orders
            .search_for_seller(caller.user_id, keyword, page)
            .await?)
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound { order_id }.into())
    }

    /// Fetches live product data, treating a missing product as a
    /// domain error rather than an upstream one.
    async fn fetch_available(&self, product_id: &common::ProductId) -> Result<ProductSnapshot> {
        self.inventory
            .fetch_product(product_id)
            .await?
            .ok_or_else(|| {
                DomainError::ProductUnavailable {
                    product_id: product_id.clone(),
                }
                .into()
            })
    }

    /// Inserts the order, regenerating the order number once if the
    /// random suffix collides.
    async fn insert_with_number_retry(&self, mut order: Order) -> Result<Order> {
        match self.orders.insert(&order).await {
            Ok(()) => Ok(order),
            Err(StoreError::DuplicateOrderNumber { order_number }) => {
                tracing::warn!(order_number, "order number collision, regenerating");
                order.regenerate_order_number();
                self.orders.insert(&order).await?;
                Ok(order)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn adjust_stock_best_effort(&self, order: &Order, direction: Adjust) {
        let adjustments: Vec<StockAdjustment> = order
            .items
            .iter()
            .map(|item| StockAdjustment {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            })
            .collect();

        let result = match direction {
            Adjust::Decrement => self.inventory.decrement_stock(&adjustments).await,
            Adjust::Increment => self.inventory.increment_stock(&adjustments).await,
        };

        match result {
            Ok(outcome) => {
                for item in outcome.failures() {
                    metrics::counter!("stock_adjustment_failures_total").increment(1);
                    tracing::warn!(
                        order_number = %order.order_number,
                        direction = direction.as_str(),
                        product_id = %item.product_id,
                        error = item.error.as_deref().unwrap_or("unspecified"),
                        "stock adjustment rejected for item, order state is unaffected"
                    );
                }
            }
            Err(e) => {
                metrics::counter!("stock_adjustment_failures_total").increment(1);
                tracing::warn!(
                    order_number = %order.order_number,
                    direction = direction.as_str(),
                    error = %e,
                    "stock adjustment failed, order state is unaffected"
                );
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Adjust {
    Decrement,
    Increment,
}

impl Adjust {
    fn as_str(self) -> &'static str {
        match self {
            Adjust::Decrement => "decrement",
            Adjust::Increment => "increment",
        }
    }
}

/// Builds an order line from live product data.
fn snapshot_item(product: &ProductSnapshot, quantity: u32) -> OrderItem {
    OrderItem::new(
        product.id.clone(),
        product.name.clone(),
        product.description.clone(),
        product.price,
        quantity,
        product.seller_id,
        product.seller_name.clone(),
        product.thumbnail(),
    )
}

/// Rejects addresses missing a required field.
fn validate_shipping_address(address: &ShippingAddress) -> std::result::Result<(), DomainError> {
    let required = [
        ("full_name", &address.full_name),
        ("address_line1", &address.address_line1),
        ("city", &address.city),
        ("postal_code", &address.postal_code),
        ("country", &address.country),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DomainError::InvalidArgument {
                message: format!("Shipping address field {field} is required"),
            });
        }
    }
    Ok(())
}
