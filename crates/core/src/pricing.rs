use serde::{Deserialize, Serialize};

/// Result of applying a percentage discount to a single price. Every field is
/// rounded to two decimal places.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscountQuote {
    pub price: f64,
    pub percent: f64,
    pub discount_amount: f64,
    pub final_price: f64,
}

pub fn calc_discount(price: f64, percent: f64) -> DiscountQuote {
    let discount_amount = price * percent / 100.0;
    let final_price = price - discount_amount;

    DiscountQuote {
        price: round2(price),
        percent: round2(percent),
        discount_amount: round2(discount_amount),
        final_price: round2(final_price),
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
