use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::Row;

use storeagent_core::domain::order::{NewOrder, Order, OrderId};
use storeagent_core::domain::product::ProductId;

use super::{product_not_found, OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<Order, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let product_id: i64 =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let total_price: f64 =
        row.try_get("total_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("created_at: {e}")))?;

    Ok(Order {
        id: OrderId(id),
        product_id: ProductId(product_id),
        quantity,
        total_price,
        created_at,
    })
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let unit_price: Option<f64> = sqlx::query_scalar("SELECT price FROM products WHERE id = ?")
            .bind(order.product_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        let unit_price = unit_price.ok_or_else(|| product_not_found(order.product_id))?;

        let total_price = order.total_for(unit_price);
        let created_at = Utc::now().trunc_subsecs(6);
        let result = sqlx::query(
            "INSERT INTO orders (product_id, quantity, total_price, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(order.product_id.0)
        .bind(order.quantity)
        .bind(total_price)
        // Fixed-width timestamps keep `ORDER BY created_at` chronological.
        .bind(created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Order {
            id: OrderId(result.last_insert_rowid()),
            product_id: order.product_id,
            quantity: order.quantity,
            total_price,
            created_at,
        })
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, product_id, quantity, total_price, created_at FROM orders WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_order(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, product_id, quantity, total_price, created_at
             FROM orders ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_order).collect()
    }
}
