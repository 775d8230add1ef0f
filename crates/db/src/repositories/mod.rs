use async_trait::async_trait;
use thiserror::Error;

use storeagent_core::domain::order::{NewOrder, Order, OrderId};
use storeagent_core::domain::product::{NewProduct, Product, ProductId, ProductStatistics};
use storeagent_core::errors::DomainError;

pub mod memory;
pub mod order;
pub mod product;

pub use memory::{InMemoryOrderRepository, InMemoryProductRepository};
pub use order::SqlOrderRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] DomainError),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Products ordered by id, optionally restricted to one category. Category
    /// comparison uses [`storeagent_core::category_matches`].
    async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError>;
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError>;
    async fn statistics(&self) -> Result<ProductStatistics, RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Fails with [`RepositoryError::NotFound`] when the product does not exist.
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError>;
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Order>, RepositoryError>;
}

pub(crate) fn product_not_found(id: ProductId) -> RepositoryError {
    RepositoryError::NotFound(format!("Product with id={} not found", id.0))
}
