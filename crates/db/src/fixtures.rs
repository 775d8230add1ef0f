use serde::Serialize;

use storeagent_core::domain::product::NewProduct;

use crate::repositories::{ProductRepository, RepositoryError};

/// Demo catalog loaded by `storeagent seed` and the end-to-end tests.
const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct { name: "Ноутбук", price: 50000.0, category: "Электроника", in_stock: true },
    DemoProduct { name: "Мышка", price: 1500.0, category: "Электроника", in_stock: true },
    DemoProduct { name: "Кофе", price: 1200.0, category: "Продукты", in_stock: false },
];

struct DemoProduct {
    name: &'static str,
    price: f64,
    category: &'static str,
    in_stock: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeedResult {
    pub inserted: usize,
    pub skipped: bool,
}

pub struct DemoCatalog;

impl DemoCatalog {
    pub fn products() -> Result<Vec<NewProduct>, RepositoryError> {
        DEMO_PRODUCTS
            .iter()
            .map(|p| {
                NewProduct::new(p.name, p.price, p.category, p.in_stock)
                    .map_err(RepositoryError::from)
            })
            .collect()
    }

    /// Inserts the demo products unless the catalog already holds anything.
    pub async fn seed_if_empty(
        repo: &dyn ProductRepository,
    ) -> Result<SeedResult, RepositoryError> {
        if !repo.list(None).await?.is_empty() {
            tracing::info!(event_name = "db.seed.skipped", "catalog already populated");
            return Ok(SeedResult { inserted: 0, skipped: true });
        }

        let mut inserted = 0;
        for product in Self::products()? {
            repo.insert(product).await?;
            inserted += 1;
        }
        tracing::info!(event_name = "db.seed.completed", inserted, "demo catalog seeded");

        Ok(SeedResult { inserted, skipped: false })
    }
}
