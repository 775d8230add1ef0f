use serde::{Deserialize, Serialize};

/// Typed result of intent planning. The tag alone decides which fields exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Plan {
    ListByCategory {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    },
    Stats,
    AddProduct {
        name: String,
        price: f64,
        category: String,
        #[serde(default = "default_in_stock")]
        in_stock: bool,
    },
    Discount {
        product_id: i64,
        discount_percent: f64,
    },
    Unknown,
}

fn default_in_stock() -> bool {
    true
}

impl Plan {
    pub fn intent(&self) -> &'static str {
        match self {
            Self::ListByCategory { .. } => "list_by_category",
            Self::Stats => "stats",
            Self::AddProduct { .. } => "add_product",
            Self::Discount { .. } => "discount",
            Self::Unknown => "unknown",
        }
    }

    /// Whether executing this plan needs a tool-server session.
    pub fn needs_tools(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Plan;

    #[test]
    fn plans_serialize_with_intent_tag() {
        let list = Plan::ListByCategory { category: Some("Электроника".to_string()) };
        assert_eq!(
            serde_json::to_value(&list).expect("serialize"),
            json!({"intent": "list_by_category", "category": "Электроника"})
        );
        assert_eq!(serde_json::to_value(Plan::Stats).expect("serialize"), json!({"intent": "stats"}));

        let discount = Plan::Discount { product_id: 1, discount_percent: 15.0 };
        assert_eq!(
            serde_json::to_value(&discount).expect("serialize"),
            json!({"intent": "discount", "product_id": 1, "discount_percent": 15.0})
        );
    }

    #[test]
    fn add_product_defaults_to_in_stock() {
        let plan: Plan = serde_json::from_value(json!({
            "intent": "add_product",
            "name": "Мышка",
            "price": 1500.0,
            "category": "Электроника"
        }))
        .expect("deserialize");

        assert!(matches!(plan, Plan::AddProduct { in_stock: true, .. }));
        assert_eq!(plan.intent(), "add_product");
        assert!(!Plan::Unknown.needs_tools());
    }
}
