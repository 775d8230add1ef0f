//! Storeagent MCP (Model Context Protocol) Server
//!
//! Exposes the product catalog and orders as MCP tools over stdio. Every tool
//! answers with one text content block holding JSON; domain failures are
//! reported as `{"error": ...}` objects rather than protocol errors, so callers
//! can render them.
//!
//! ## Tools
//!
//! - `list_products`, `get_product`, `add_product`, `get_statistics`
//! - `create_order`, `get_order`, `list_orders`

mod server;

pub use server::{
    AddProductInput, CreateOrderInput, GetOrderInput, GetProductInput, ListProductsInput,
    StoreMcpServer,
};

use storeagent_core::errors::DomainError;
use storeagent_db::repositories::RepositoryError;
use thiserror::Error;

/// Failures a tool reports back to the caller as an `error` field.
#[derive(Error, Debug)]
pub enum ToolFailure {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<DomainError> for ToolFailure {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::EmptyProductName | DomainError::EmptyCategory => {
                Self::Validation("name and category are required".to_string())
            }
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ToolFailure {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(message) => Self::NotFound(message),
            RepositoryError::Validation(domain) => domain.into(),
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Result type for tool bodies
pub type ToolResult<T> = Result<T, ToolFailure>;

#[cfg(test)]
mod tests {
    use storeagent_core::errors::DomainError;
    use storeagent_db::repositories::RepositoryError;

    use super::ToolFailure;

    #[test]
    fn blank_fields_share_one_message() {
        assert_eq!(
            ToolFailure::from(DomainError::EmptyCategory).to_string(),
            "name and category are required"
        );
        assert_eq!(ToolFailure::from(DomainError::NegativePrice).to_string(), "price must be >= 0");
    }

    #[test]
    fn repository_not_found_keeps_message() {
        let failure =
            ToolFailure::from(RepositoryError::NotFound("Product with id=3 not found".to_string()));
        assert!(matches!(failure, ToolFailure::NotFound(_)));
        assert_eq!(failure.to_string(), "Product with id=3 not found");
    }
}
