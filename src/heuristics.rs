// 🔍 Text Heuristics - Deterministic extractors over the raw message
//
// These backfill or override fields in the AI-parsed guess. All of them are
// pure functions of immutable input; the only "failure" is no match found.

use crate::catalog::Catalog;
use crate::parser::GuessItem;
use regex::Regex;

/// Words that follow "to"/"for" without being a customer name.
const NOT_A_NAME: [&str; 12] = [
    "the", "a", "an", "me", "my", "him", "her", "them", "it", "us", "cash", "free",
];

/// Extract an explicitly stated payment amount from the raw text.
///
/// "paid nothing" / "no payment" phrasings resolve to exactly 0, which must
/// override whatever the upstream parser guessed. Otherwise we look for a
/// payment verb next to a number, in either order, with an optional currency
/// token in front of the number.
pub fn extract_paid_amount(text: &str) -> Option<f64> {
    // Zero-payment phrasing first
    let zero_re =
        Regex::new(r"(?i)\b(?:paid\s+(?:nothing|none|zero)|no\s+payment|didn'?t\s+pay)\b").ok()?;
    if zero_re.is_match(text) {
        return Some(0.0);
    }

    // "paid 15", "gave $20", "pays le 30"
    let verb_then_number =
        Regex::new(r"(?i)\b(?:paid|pays|pay|gave|gives)\s+(?:(?:egp|le|usd|[$£€])\s*)?(\d+(?:\.\d+)?)")
            .ok()?;
    if let Some(cap) = verb_then_number.captures(text) {
        if let Ok(v) = cap[1].parse::<f64>() {
            return Some(v);
        }
    }

    // "15 paid", "$20 payment"
    let number_then_verb =
        Regex::new(r"(?i)(?:(?:egp|le|usd|[$£€])\s*)?(\d+(?:\.\d+)?)\s+(?:paid|payment)\b").ok()?;
    if let Some(cap) = number_then_verb.captures(text) {
        if let Ok(v) = cap[1].parse::<f64>() {
            return Some(v);
        }
    }

    None
}

/// Infer a customer name from "to <name>" / "for <name>".
///
/// Used only when the parsed structure carries no customer. Articles and
/// pronouns are not names.
pub fn infer_customer_from_text(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)\b(?:to|for)\s+([A-Za-z][A-Za-z'-]*)").ok()?;

    for cap in re.captures_iter(text) {
        let token = cap[1].to_string();
        if !NOT_A_NAME.contains(&token.to_lowercase().as_str()) {
            return Some(token);
        }
    }

    None
}

/// Rewrite compound item names the upstream parser is biased toward.
///
/// If an item arrives as "<modifier> <base>" (e.g. "matcha latte") but the
/// raw text mentions the base word and never the modifier, the message was
/// about the base item. Rewrite it, provided the base resolves on its own.
pub fn normalize_ambiguous_items(
    catalog: &Catalog,
    items: &[GuessItem],
    text: &str,
) -> Vec<GuessItem> {
    let text_lower = text.to_lowercase();

    items
        .iter()
        .map(|item| {
            let name_lower = item.name.trim().to_lowercase();
            let words: Vec<&str> = name_lower.split_whitespace().collect();

            if words.len() >= 2 {
                let modifier = words[0];
                let base = words[1..].join(" ");

                if catalog.contains(&base)
                    && text_lower.contains(&base)
                    && !text_lower.contains(modifier)
                {
                    return GuessItem {
                        name: base,
                        qty: item.qty,
                    };
                }
            }

            item.clone()
        })
        .collect()
}

/// Deterministic total for a list of items: unit price times quantity
/// (at least 1). Items that don't resolve contribute nothing.
pub fn infer_total_from_items(catalog: &Catalog, items: &[GuessItem]) -> f64 {
    items
        .iter()
        .map(|item| match catalog.lookup(&item.name) {
            Some(entry) => entry.unit_price * item.qty.max(1) as f64,
            None => 0.0,
        })
        .sum()
}

// ============================================================================
// TESTS
// ============================================================================
