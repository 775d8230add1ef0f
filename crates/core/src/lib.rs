pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use domain::order::{NewOrder, Order, OrderId};
pub use domain::product::{
    category_matches, normalize_category, NewProduct, Product, ProductId, ProductStatistics,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{calc_discount, DiscountQuote};
