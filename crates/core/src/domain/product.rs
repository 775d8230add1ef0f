use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

/// A catalog record as stored by the tool server. Ids are assigned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub in_stock: bool,
}

/// Validated input for creating a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub in_stock: bool,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
        in_stock: bool,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        let category = category.into().trim().to_string();

        if name.is_empty() {
            return Err(DomainError::EmptyProductName);
        }
        if category.is_empty() {
            return Err(DomainError::EmptyCategory);
        }
        if !price.is_finite() || price < 0.0 {
            return Err(DomainError::NegativePrice);
        }

        Ok(Self { name, price, category, in_stock })
    }

    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            category: self.category,
            in_stock: self.in_stock,
        }
    }
}

/// Aggregate figures recomputed from the full catalog on every request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductStatistics {
    pub count: u64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

impl ProductStatistics {
    pub fn from_prices(prices: &[f64]) -> Self {
        if prices.is_empty() {
            return Self::default();
        }

        let total: f64 = prices.iter().sum();
        let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            count: prices.len() as u64,
            avg_price: total / prices.len() as f64,
            min_price,
            max_price,
        }
    }
}

/// Canonical form used when comparing categories: non-breaking spaces become
/// spaces, whitespace runs collapse, and the result is lowercased.
pub fn normalize_category(raw: &str) -> String {
    raw.replace('\u{00A0}', " ").split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

pub fn category_matches(candidate: &str, filter: &str) -> bool {
    normalize_category(candidate) == normalize_category(filter)
}
