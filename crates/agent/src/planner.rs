use std::sync::LazyLock;

use regex::Regex;

use crate::plan::Plan;

const SHOW_VERBS: &[&str] = &["покажи", "показать", "выведи"];
const ADD_VERBS: &[&str] = &["добавь", "добавить"];
const STATS_KEYWORD: &str = "статист";

/// One planning rule: returns a plan when the query matches, `None` to let the
/// next rule try.
type Rule = fn(&str) -> Option<Plan>;

/// Evaluated in order; the first rule producing a plan wins.
const RULES: &[(&str, Rule)] = &[
    ("list_by_category", list_by_category),
    ("stats", stats),
    ("add_product", add_product),
    ("discount", discount),
];

/// Deterministic text-to-plan classifier for Russian catalog queries.
#[derive(Clone, Debug, Default)]
pub struct IntentPlanner;

impl IntentPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, query: &str) -> Plan {
        let text = query.trim();
        RULES
            .iter()
            .find_map(|(name, rule)| {
                let plan = rule(text)?;
                tracing::debug!(event_name = "agent.plan.rule_matched", rule = *name);
                Some(plan)
            })
            .unwrap_or(Plan::Unknown)
    }
}

fn list_by_category(text: &str) -> Option<Plan> {
    let lowered = text.to_lowercase();
    if !SHOW_VERBS.iter().any(|verb| lowered.contains(verb)) {
        return None;
    }
    let category = LIST_CATEGORY_RE.captures(text)?.get(1)?.as_str().trim().to_string();
    Some(Plan::ListByCategory { category: Some(category) })
}

fn stats(text: &str) -> Option<Plan> {
    let matched = AVERAGE_PRICE_RE.is_match(text) || text.to_lowercase().contains(STATS_KEYWORD);
    matched.then_some(Plan::Stats)
}

fn add_product(text: &str) -> Option<Plan> {
    let lowered = text.to_lowercase();
    if !ADD_VERBS.iter().any(|verb| lowered.starts_with(verb)) {
        return None;
    }

    let name = capture(&PRODUCT_NAME_RE, text).map(str::trim).filter(|name| !name.is_empty())?;
    let price = capture(&PRICE_RE, text).and_then(parse_number)?;
    let category =
        capture(&ADD_CATEGORY_RE, text).map(str::trim).filter(|category| !category.is_empty())?;

    Some(Plan::AddProduct {
        name: name.to_string(),
        price,
        category: category.to_string(),
        in_stock: true,
    })
}

fn discount(text: &str) -> Option<Plan> {
    let discount_percent = capture(&DISCOUNT_RE, text).and_then(parse_number)?;
    let product_id = capture(&PRODUCT_ID_RE, text)?.parse::<i64>().ok().filter(|id| *id > 0)?;
    Some(Plan::Discount { product_id, discount_percent })
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)?.get(1).map(|m| m.as_str())
}

/// Accepts both `,` and `.` as the decimal separator.
fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok().filter(|value| value.is_finite())
}

static LIST_CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?i)категори[ия]\s+([\w\-]+)") {
        Ok(regex) => regex,
        Err(err) => panic!("list category regex is invalid: {err}"),
    });

static AVERAGE_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?i)средн(?:яя|юю)\s+цен") {
        Ok(regex) => regex,
        Err(err) => panic!("average price regex is invalid: {err}"),
    });

static PRODUCT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?i)продукт\s*:\s*([^,]+)") {
        Ok(regex) => regex,
        Err(err) => panic!("product name regex is invalid: {err}"),
    });

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?i)цен[аы]\s*(\d+(?:[.,]\d+)?)") {
        Ok(regex) => regex,
        Err(err) => panic!("price regex is invalid: {err}"),
    });

static ADD_CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?i)категори[ия]\s*([\w\-]+)") {
        Ok(regex) => regex,
        Err(err) => panic!("add category regex is invalid: {err}"),
    });

static DISCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?i)скидк\w*\s*(\d+(?:[.,]\d+)?)%?") {
        Ok(regex) => regex,
        Err(err) => panic!("discount regex is invalid: {err}"),
    });

static PRODUCT_ID_RE: LazyLock<Regex> = LazyLock::new(|| match Regex::new(r"(?i)id\s*(\d+)") {
    Ok(regex) => regex,
    Err(err) => panic!("product id regex is invalid: {err}"),
});
