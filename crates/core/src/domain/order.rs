use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl NewOrder {
    pub fn new(product_id: ProductId, quantity: i64) -> Result<Self, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::NonPositiveQuantity);
        }
        Ok(Self { product_id, quantity })
    }

    pub fn total_for(&self, unit_price: f64) -> f64 {
        unit_price * self.quantity as f64
    }
}
