//! Rendering of tool results into answer text.

use serde_json::{Map, Number, Value};

use storeagent_core::pricing::DiscountQuote;

use crate::payload::display_value;

pub const NOTHING_FOUND: &str = "Ничего не найдено.";

pub const HELP_TEXT: &str = "Не понял запрос. Примеры:\n\
- Покажи все продукты в категории Электроника\n\
- Какая средняя цена продуктов?\n\
- Добавь новый продукт: Мышка, цена 1500, категория Электроника\n\
- Посчитай скидку 15% на товар с ID 1";

pub const ADDED_PREFIX: &str = "Добавлено:\n";

/// Keys under which a product list may arrive wrapped in an object.
pub const LIST_KEYS: &[&str] = &["products", "items", "results", "data", "content"];

/// One line per product mapping; anything else in the list is skipped.
pub fn format_products(products: &Value) -> String {
    let items = match products {
        Value::Array(items) => items.as_slice(),
        Value::Object(fields) => match unwrap_list(fields) {
            Some(items) => items,
            None if fields.is_empty() => return NOTHING_FOUND.to_string(),
            None => std::slice::from_ref(products),
        },
        _ => return NOTHING_FOUND.to_string(),
    };

    let lines = items.iter().filter_map(Value::as_object).map(product_line).collect::<Vec<_>>();
    if lines.is_empty() {
        NOTHING_FOUND.to_string()
    } else {
        lines.join("\n")
    }
}

pub fn format_added_product(product: &Value) -> String {
    if let Some(error) = product.get("error") {
        return tool_error(error);
    }
    format!("{ADDED_PREFIX}{}", format_products(&Value::Array(vec![product.clone()])))
}

pub fn format_statistics(stats: &Value) -> String {
    let stats = match stats.get("stats") {
        Some(nested @ Value::Object(_)) => nested,
        _ => stats,
    };
    let Some(fields) = stats.as_object() else {
        return format!("Ошибка: ожидался объект статистики, получено {}", display_value(stats));
    };
    if let Some(error) = fields.get("error") {
        return tool_error(error);
    }

    let field = |key: &str| fields.get(key).map(display_value).unwrap_or_else(|| "0".to_string());
    format!(
        "Всего продуктов: {}\nСредняя цена: {}\nМин. цена: {}\nМакс. цена: {}",
        field("count"),
        field("avg_price"),
        field("min_price"),
        field("max_price"),
    )
}

/// Combined product and discount text. `quote` is `None` when the product
/// mapping carried no usable price.
pub fn format_discount(product: &Value, quote: Option<&DiscountQuote>) -> String {
    if let Some(error) = product.get("error") {
        return tool_error(error);
    }
    let Some(quote) = quote else {
        return format!("Ошибка MCP: у товара нет цены ({})", display_value(product));
    };

    format!(
        "Товар: #{} — {}\nЦена: {}\nСкидка: {}%\nЦена со скидкой: {:.2}",
        product.get("id").map(display_value).unwrap_or_else(|| "N/A".to_string()),
        product.get("name").map(display_value).unwrap_or_else(|| "Без названия".to_string()),
        product.get("price").map(display_value).unwrap_or_else(|| number(quote.price)),
        number(quote.percent),
        quote.final_price,
    )
}

pub fn tool_error(error: &Value) -> String {
    format!("Ошибка MCP: {}", display_value(error))
}

pub(crate) fn unwrap_list(fields: &Map<String, Value>) -> Option<&[Value]> {
    LIST_KEYS.iter().find_map(|key| fields.get(*key).and_then(Value::as_array)).map(Vec::as_slice)
}

fn product_line(product: &Map<String, Value>) -> String {
    let text = |key: &str, default: &str| {
        product.get(key).map(display_value).unwrap_or_else(|| default.to_string())
    };
    let stock = if product.get("in_stock").is_some_and(is_truthy) {
        "в наличии"
    } else {
        "нет в наличии"
    };

    format!(
        "#{} — {} — {} — {} — {}",
        text("id", "N/A"),
        text("name", "Без названия"),
        text("price", "0"),
        text("category", "Без категории"),
        stock,
    )
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Renders floats the way JSON does, so `15.0` stays `15.0`.
fn number(value: f64) -> String {
    Number::from_f64(value).map(|n| n.to_string()).unwrap_or_else(|| value.to_string())
}
