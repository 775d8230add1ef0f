use sqlx::Row;

use storeagent_core::domain::product::{
    category_matches, NewProduct, Product, ProductId, ProductStatistics,
};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price: f64 = row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let in_stock: bool =
        row.try_get("in_stock").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Product { id: ProductId(id), name, price, category, in_stock })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let rows =
            sqlx::query("SELECT id, name, price, category, in_stock FROM products ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        // SQLite's lower() only folds ASCII, so Cyrillic categories are matched here.
        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            let product = row_to_product(row)?;
            if category.map_or(true, |filter| category_matches(&product.category, filter)) {
                products.push(product);
            }
        }
        Ok(products)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row =
            sqlx::query("SELECT id, name, price, category, in_stock FROM products WHERE id = ?")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let result =
            sqlx::query("INSERT INTO products (name, price, category, in_stock) VALUES (?, ?, ?, ?)")
                .bind(&product.name)
                .bind(product.price)
                .bind(&product.category)
                .bind(product.in_stock)
                .execute(&self.pool)
                .await?;

        Ok(product.with_id(ProductId(result.last_insert_rowid())))
    }

    async fn statistics(&self) -> Result<ProductStatistics, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count, AVG(price) AS avg_price,
                    MIN(price) AS min_price, MAX(price) AS max_price
             FROM products",
        )
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let avg_price: Option<f64> =
            row.try_get("avg_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let min_price: Option<f64> =
            row.try_get("min_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let max_price: Option<f64> =
            row.try_get("max_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        Ok(ProductStatistics {
            count: u64::try_from(count).map_err(|e| RepositoryError::Decode(e.to_string()))?,
            avg_price: avg_price.unwrap_or(0.0),
            min_price: min_price.unwrap_or(0.0),
            max_price: max_price.unwrap_or(0.0),
        })
    }
}
