//! Drives the real `storeagent-mcp` binary through the agent runtime against a
//! seeded temporary database.

use std::sync::Arc;
use std::time::Duration;

use storeagent_agent::{AgentRuntime, McpLauncher, Plan};
use storeagent_db::repositories::SqlProductRepository;
use storeagent_db::{connect_with_settings, migrations, DemoCatalog};
use tempfile::TempDir;

async fn seeded_runtime() -> (TempDir, AgentRuntime) {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("e2e.db").display());

    let pool = connect_with_settings(&url, 1, 10).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    DemoCatalog::seed_if_empty(&SqlProductRepository::new(pool.clone())).await.expect("seed");
    pool.close().await;

    let launcher = McpLauncher::new(env!("CARGO_BIN_EXE_storeagent-mcp"), url)
        .with_working_dir(dir.path())
        .with_handshake_timeout(Duration::from_secs(20));
    let runtime = AgentRuntime::new(Arc::new(launcher), Duration::from_secs(20));
    (dir, runtime)
}

#[tokio::test]
async fn category_listing_over_stdio() {
    let (_dir, runtime) = seeded_runtime().await;
    let state =
        runtime.run("Покажи все продукты в категории Электроника").await.expect("list query");

    assert_eq!(state.plan, Plan::ListByCategory { category: Some("Электроника".to_string()) });
    assert!(state.answer.contains("#1"), "answer: {}", state.answer);
    assert!(state.answer.contains("Ноутбук"), "answer: {}", state.answer);
    assert!(!state.answer.contains("Кофе"), "answer: {}", state.answer);
    assert_eq!(state.trace.last().map(String::as_str), Some("called:list_products"));
}

#[tokio::test]
async fn average_price_over_stdio() {
    let (_dir, runtime) = seeded_runtime().await;
    let state = runtime.run("Какая средняя цена продуктов?").await.expect("stats query");

    // (50000 + 1500 + 1200) / 3
    assert!(state.answer.contains("Средняя цена: 17566.66"), "answer: {}", state.answer);
    assert!(state.answer.contains("Всего продуктов: 3"), "answer: {}", state.answer);
}

#[tokio::test]
async fn discount_over_stdio() {
    let (_dir, runtime) = seeded_runtime().await;
    let state = runtime.run("Посчитай скидку 15% на товар с ID 1").await.expect("discount query");

    assert!(state.answer.contains("42500"), "answer: {}", state.answer);
    assert_eq!(state.trace.last().map(String::as_str), Some("called:get_product+calc_discount"));
}

#[tokio::test]
async fn added_product_is_visible_to_next_session() {
    let (_dir, runtime) = seeded_runtime().await;
    let added = runtime
        .run("Добавь новый продукт: Чайник, цена 2500, категория Электроника")
        .await
        .expect("add query");
    assert!(added.answer.starts_with("Добавлено:\n#4 — Чайник"), "answer: {}", added.answer);

    let listed =
        runtime.run("Покажи все продукты в категории Электроника").await.expect("list query");
    assert!(listed.answer.contains("Чайник"), "answer: {}", listed.answer);
}

#[tokio::test]
async fn average_of_two_products_matches_reference() {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("pair.db").display());
    let pool = connect_with_settings(&url, 1, 10).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    let repo = SqlProductRepository::new(pool.clone());
    for (name, price, category) in [("Ноутбук", 50000.0, "Электроника"), ("Кофе", 1200.0, "Продукты")]
    {
        let product = storeagent_core::NewProduct::new(name, price, category, true).expect("valid");
        storeagent_db::repositories::ProductRepository::insert(&repo, product)
            .await
            .expect("insert");
    }
    pool.close().await;

    let launcher = McpLauncher::new(env!("CARGO_BIN_EXE_storeagent-mcp"), url)
        .with_working_dir(dir.path());
    let runtime = AgentRuntime::new(Arc::new(launcher), Duration::from_secs(20));
    let state = runtime.run("Какая средняя цена продуктов?").await.expect("stats query");

    assert!(state.answer.contains("25600"), "answer: {}", state.answer);
}
