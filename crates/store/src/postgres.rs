use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Cart, Order, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    cart_store::CartStore,
    order_store::{OrderStore, Page},
};

/// PostgreSQL-backed order store.
///
/// Orders are stored as whole JSONB documents alongside a handful of
/// extracted columns for indexing. The document is the source of truth;
/// the columns exist only for query predicates and ordering.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the orders table and its indexes if they do not exist.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id UUID PRIMARY KEY,
                order_number TEXT NOT NULL,
                buyer_id UUID NOT NULL,
                seller_ids UUID[] NOT NULL,
                status TEXT NOT NULL,
                is_removed BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL,
                doc JSONB NOT NULL,
                CONSTRAINT orders_order_number_key UNIQUE (order_number)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_orders_buyer ON orders (buyer_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_orders_sellers ON orders USING GIN (seller_ids)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        tracing::debug!("orders schema ready");
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let doc: serde_json::Value = row.try_get("doc")?;
        Ok(serde_json::from_value(doc)?)
    }

    fn seller_uuids(order: &Order) -> Vec<Uuid> {
        order.seller_ids.iter().map(|s| s.as_uuid()).collect()
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let doc = serde_json::to_value(order)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, buyer_id, seller_ids, status, is_removed, created_at, doc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.buyer_id.as_uuid())
        .bind(Self::seller_uuids(order))
        .bind(order.status.as_str())
        .bind(order.is_removed)
        .bind(order.created_at)
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("orders_order_number_key") {
                    return StoreError::DuplicateOrderNumber {
                        order_number: order.order_number.clone(),
                    };
                }
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let doc = serde_json::to_value(order)?;

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, is_removed = $3, doc = $4
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.is_removed)
        .bind(doc)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_if_status(&self, order: &Order, expected: OrderStatus) -> Result<bool> {
        let doc = serde_json::to_value(order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, is_removed = $3, doc = $4
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.is_removed)
        .bind(doc)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT doc FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_for_buyer(&self, buyer_id: UserId, page: Page) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM orders
            WHERE buyer_id = $1 AND NOT is_removed
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(buyer_id.as_uuid())
        .bind(i64::try_from(page.offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(page.limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_for_seller(
        &self,
        seller_id: UserId,
        status: Option<OrderStatus>,
        page: Page,
    ) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM orders
            WHERE $1 = ANY(seller_ids)
              AND NOT is_removed
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(seller_id.as_uuid())
        .bind(status.map(|s| s.as_str()))
        .bind(i64::try_from(page.offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(page.limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn search_for_seller(
        &self,
        seller_id: UserId,
        keyword: &str,
        page: Page,
    ) -> Result<Vec<Order>> {
        let pattern = format!("%{}%", keyword.replace('%', "\\%").replace('_', "\\_"));
        let rows = sqlx::query(
            r#"
            SELECT doc FROM orders
            WHERE $1 = ANY(seller_ids)
              AND NOT is_removed
              AND (order_number ILIKE $2 OR doc->>'buyer_email' ILIKE $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(seller_id.as_uuid())
        .bind(pattern)
        .bind(i64::try_from(page.offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(page.limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}

/// PostgreSQL-backed cart store. One row per user.
#[derive(Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    /// Creates a new PostgreSQL cart store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the carts table if it does not exist.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS carts (
                user_id UUID PRIMARY KEY,
                doc JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::debug!("carts schema ready");
        Ok(())
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query("SELECT doc FROM carts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            let doc: serde_json::Value = r.try_get("doc")?;
            Ok(serde_json::from_value(doc)?)
        })
        .transpose()
    }

    async fn upsert(&self, cart: &Cart) -> Result<()> {
        let doc = serde_json::to_value(cart)?;

        sqlx::query(
            r#"
            INSERT INTO carts (user_id, doc)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(cart.user_id.as_uuid())
        .bind(doc)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
