// ABOUTME: Product reference parsing and price helpers for tracked items
// ABOUTME: Accepts bare article ids or marketplace catalog URLs

use anyhow::{bail, Context, Result};
use url::Url;

use crate::api::{Item, Plan};

/// Extract the article id from a catalog URL or a bare article number.
///
/// Accepted forms: `12345`, `https://www.wildberries.ru/catalog/12345/detail.aspx`.
pub fn parse_product_ref(input: &str) -> Result<u64> {
    let input = input.trim();
    if input.is_empty() {
        bail!("Enter a product URL or article id");
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        return input
            .parse()
            .with_context(|| format!("Article id out of range: {}", input));
    }

    let url = Url::parse(input).with_context(|| format!("Not a URL or article id: {}", input))?;
    let mut segments = url
        .path_segments()
        .with_context(|| format!("URL has no path: {}", input))?;

    while let Some(segment) = segments.next() {
        if segment == "catalog" {
            if let Some(article) = segments.next() {
                if !article.is_empty() && article.chars().all(|c| c.is_ascii_digit()) {
                    return article
                        .parse()
                        .with_context(|| format!("Article id out of range: {}", article));
                }
            }
            break;
        }
    }

    bail!("Could not find an article id in {}", input)
}

/// Percentage between current and desired price, as shown on item cards.
pub fn discount_percent(item: &Item) -> i64 {
    if item.current_price > 0.0 {
        100 - (item.desired_price / item.current_price * 100.0).round() as i64
    } else {
        0
    }
}

/// Undiscounted price of a plan, for display next to the discounted one.
pub fn plan_list_price(plan: &Plan) -> Option<i64> {
    if plan.discount > 0.0 && plan.discount < 100.0 {
        Some((plan.price / (1.0 - plan.discount / 100.0)).round() as i64)
    } else {
        None
    }
}

/// Format a price in whole rubles grouped by thousands, e.g. `12 345 ₽`.
pub fn format_rub(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{} ₽", grouped)
    } else {
        format!("{} ₽", grouped)
    }
}
