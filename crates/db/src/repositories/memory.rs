use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use storeagent_core::domain::order::{NewOrder, Order, OrderId};
use storeagent_core::domain::product::{
    category_matches, NewProduct, Product, ProductId, ProductStatistics,
};

use super::{product_not_found, OrderRepository, ProductRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<i64, Product>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: RwLock::new(products.into_iter().map(|p| (p.id.0, p)).collect()),
        }
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|p| category.map_or(true, |filter| category_matches(&p.category, filter)))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        let next_id = products.keys().next_back().copied().unwrap_or(0) + 1;
        let product = product.with_id(ProductId(next_id));
        products.insert(next_id, product.clone());
        Ok(product)
    }

    async fn statistics(&self) -> Result<ProductStatistics, RepositoryError> {
        let products = self.products.read().await;
        let prices = products.values().map(|p| p.price).collect::<Vec<_>>();
        Ok(ProductStatistics::from_prices(&prices))
    }
}

/// Orders backed by a shared product map so totals use current prices.
pub struct InMemoryOrderRepository {
    products: std::sync::Arc<InMemoryProductRepository>,
    orders: RwLock<BTreeMap<i64, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new(products: std::sync::Arc<InMemoryProductRepository>) -> Self {
        Self { products, orders: RwLock::new(BTreeMap::new()) }
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let product = self
            .products
            .find_by_id(order.product_id)
            .await?
            .ok_or_else(|| product_not_found(order.product_id))?;

        let mut orders = self.orders.write().await;
        let next_id = orders.keys().next_back().copied().unwrap_or(0) + 1;
        let created = Order {
            id: OrderId(next_id),
            product_id: order.product_id,
            quantity: order.quantity,
            total_price: order.total_for(product.price),
            created_at: Utc::now(),
        };
        orders.insert(next_id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id.0).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        let mut listed = orders.values().cloned().collect::<Vec<_>>();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(listed)
    }
}
