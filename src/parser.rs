// 🧾 Intent Parser - External guess contract + deterministic fallback
//
// The natural-language extraction service is an external collaborator: it
// takes the raw message and returns a best-effort structured guess, or
// nothing at all. This module pins down that wire contract (`ParsedGuess`),
// the trait the engine consumes it through, and a keyword-driven fallback
// parser so the assistant keeps working when no AI service is wired in.

use crate::catalog::Catalog;
use crate::heuristics::{extract_paid_amount, infer_customer_from_text};
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// WIRE TYPES
// ============================================================================

/// One guessed line item: raw name + quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessItem {
    pub name: String,
    #[serde(default = "default_qty")]
    pub qty: u32,
}

fn default_qty() -> u32 {
    1
}

/// Best-effort structured guess for one message.
///
/// `intent` is a free-form label ("sale", "debt", "settle", ...); the
/// resolver maps it onto a kind and treats anything else as unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedGuess {
    #[serde(default)]
    pub intent: String,

    #[serde(default)]
    pub items: Vec<GuessItem>,

    #[serde(default)]
    pub customer: Option<String>,

    #[serde(default)]
    pub paid: Option<f64>,
}

impl ParsedGuess {
    /// A bare command guess with no items/customer/paid.
    fn command(intent: &str) -> Self {
        ParsedGuess {
            intent: intent.to_string(),
            ..Default::default()
        }
    }
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// Anything that can turn a raw message into a structured guess.
///
/// Returning `None` means "could not interpret". The engine must answer
/// with guidance, never crash.
pub trait IntentParser {
    fn parse(&self, text: &str) -> Option<ParsedGuess>;

    /// Parser name (for logging).
    fn name(&self) -> &str {
        "unnamed"
    }
}

// ============================================================================
// KEYWORD PARSER (fallback implementation)
// ============================================================================

/// Deterministic keyword parser. Scans for command phrases first, then for
/// catalog item names (longest first, so "matcha latte" is never read as a
/// "latte" plus a stray "matcha").
pub struct KeywordParser<'a> {
    catalog: &'a Catalog,
}

impl<'a> KeywordParser<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        KeywordParser { catalog }
    }

    fn parse_settle(&self, text: &str) -> ParsedGuess {
        let mut guess = ParsedGuess::command("settle");

        // "Ahmed settled ..." / "Ahmed paid back ..."
        if let Ok(re) = Regex::new(r"(?i)\b([A-Za-z][A-Za-z'-]*)\s+(?:settled|paid\s+back)") {
            if let Some(cap) = re.captures(text) {
                guess.customer = Some(cap[1].to_string());
            }
        }
        if guess.customer.is_none() {
            guess.customer = infer_customer_from_text(text);
        }

        // Optional cap: "settled 20", "paid back 14.50"
        if let Ok(re) = Regex::new(r"(?i)\b(?:settled?|paid\s+back)\s+(\d+(?:\.\d+)?)") {
            if let Some(cap) = re.captures(text) {
                guess.paid = cap[1].parse().ok();
            }
        }
        if guess.paid.is_none() {
            guess.paid = extract_paid_amount(text);
        }

        guess
    }

    fn scan_items(&self, text_lower: &str) -> Vec<GuessItem> {
        // Longest names first; matched spans are blanked out so shorter
        // names can't re-match inside them.
        let mut entries = self.catalog.items();
        entries.sort_by(|a, b| b.name.len().cmp(&a.name.len()));

        let mut masked = text_lower.to_string();
        let mut items: Vec<GuessItem> = Vec::new();

        for entry in entries {
            let name = entry.name.to_lowercase();

            while let Some(pos) = masked.find(&name) {
                let qty = trailing_quantity(&masked[..pos]).unwrap_or(1);
                masked.replace_range(pos..pos + name.len(), &" ".repeat(name.len()));

                match items.iter_mut().find(|i| i.name == entry.name) {
                    Some(existing) => existing.qty += qty,
                    None => items.push(GuessItem {
                        name: entry.name.clone(),
                        qty,
                    }),
                }
            }
        }

        items
    }
}

impl<'a> IntentParser for KeywordParser<'a> {
    fn parse(&self, text: &str) -> Option<ParsedGuess> {
        let lower = text.to_lowercase();
        if lower.trim().is_empty() {
            return None;
        }

        if contains_any(&lower, &["help", "what can you do"]) {
            return Some(ParsedGuess::command("help"));
        }
        if contains_any(&lower, &["menu", "price list", "prices"]) {
            return Some(ParsedGuess::command("show_menu"));
        }
        if contains_any(&lower, &["clear all", "start over", "wipe everything"]) {
            return Some(ParsedGuess::command("clear_all"));
        }
        if contains_any(&lower, &["summary", "totals", "the books"]) {
            return Some(ParsedGuess::command("summary"));
        }
        if contains_any(&lower, &["list debts", "who owes", "open debts", "debts"]) {
            let mut guess = ParsedGuess::command("list_debts");
            guess.customer = owed_by_customer(text).or_else(|| infer_customer_from_text(text));
            return Some(guess);
        }
        if contains_any(&lower, &["settle", "paid back", "paid off"]) {
            return Some(self.parse_settle(text));
        }

        // Transaction message: needs at least one recognizable item
        let items = self.scan_items(&lower);
        if items.is_empty() {
            return None;
        }

        let intent = if contains_any(&lower, &["owes", "on credit", "will pay later", "iou"]) {
            "debt"
        } else {
            "sale"
        };

        Some(ParsedGuess {
            intent: intent.to_string(),
            items,
            customer: infer_customer_from_text(text),
            paid: extract_paid_amount(text),
        })
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// "what does Ahmed owe" → Ahmed
fn owed_by_customer(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)\bdoes\s+([A-Za-z][A-Za-z'-]*)\s+owe").ok()?;
    re.captures(text).map(|cap| cap[1].to_string())
}

/// Quantity immediately before an item mention: "2 lattes", "3x muffin".
fn trailing_quantity(prefix: &str) -> Option<u32> {
    let trimmed = prefix.trim_end();
    let trimmed = trimmed.strip_suffix('x').unwrap_or(trimmed).trim_end();

    let digits: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_fixture(catalog: &Catalog) -> KeywordParser<'_> {
        KeywordParser::new(catalog)
    }

    #[test]
    fn test_sale_with_quantity_customer_and_paid() {
        let catalog = Catalog::default_menu();
        let parser = parser_fixture(&catalog);

        let guess = parser.parse("2 lattes for Ahmed, paid 30").unwrap();
        assert_eq!(guess.intent, "sale");
        assert_eq!(guess.items, vec![GuessItem { name: "latte".to_string(), qty: 2 }]);
        assert_eq!(guess.customer, Some("Ahmed".to_string()));
        assert_eq!(guess.paid, Some(30.0));
    }

    #[test]
    fn test_compound_item_not_double_counted() {
        let catalog = Catalog::default_menu();
        let parser = parser_fixture(&catalog);

        let guess = parser.parse("one matcha latte to sara").unwrap();
        assert_eq!(guess.items.len(), 1);
        assert_eq!(guess.items[0].name, "matcha latte");
    }

    #[test]
    fn test_separate_mentions_both_found() {
        let catalog = Catalog::default_menu();
        let parser = parser_fixture(&catalog);

        let guess = parser.parse("a latte and a matcha for omar").unwrap();
        let mut names: Vec<&str> = guess.items.iter().map(|i| i.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["latte", "matcha"]);
    }

    #[test]
    fn test_settle_with_cap() {
        let catalog = Catalog::default_menu();
        let parser = parser_fixture(&catalog);

        let guess = parser.parse("Ahmed paid back 20").unwrap();
        assert_eq!(guess.intent, "settle");
        assert_eq!(guess.customer, Some("Ahmed".to_string()));
        assert_eq!(guess.paid, Some(20.0));
    }

    #[test]
    fn test_settle_without_cap() {
        let catalog = Catalog::default_menu();
        let parser = parser_fixture(&catalog);

        let guess = parser.parse("settle everything for Mona").unwrap();
        assert_eq!(guess.intent, "settle");
        assert_eq!(guess.customer, Some("Mona".to_string()));
        assert_eq!(guess.paid, None);
    }

    #[test]
    fn test_command_phrases() {
        let catalog = Catalog::default_menu();
        let parser = parser_fixture(&catalog);

        assert_eq!(parser.parse("show me the menu").unwrap().intent, "show_menu");
        assert_eq!(parser.parse("summary please").unwrap().intent, "summary");
        assert_eq!(parser.parse("who owes what?").unwrap().intent, "list_debts");
        assert_eq!(parser.parse("help").unwrap().intent, "help");
        assert_eq!(parser.parse("clear all records").unwrap().intent, "clear_all");
    }

    #[test]
    fn test_debts_for_one_customer() {
        let catalog = Catalog::default_menu();
        let parser = parser_fixture(&catalog);

        let guess = parser.parse("what does Ahmed owe in debts").unwrap();
        assert_eq!(guess.intent, "list_debts");
        assert_eq!(guess.customer, Some("Ahmed".to_string()));
    }

    #[test]
    fn test_uninterpretable_returns_none() {
        let catalog = Catalog::default_menu();
        let parser = parser_fixture(&catalog);

        assert!(parser.parse("hello there").is_none());
        assert!(parser.parse("   ").is_none());
    }

    #[test]
    fn test_guess_deserializes_from_service_json() {
        let json = r#"{
            "intent": "sale",
            "items": [{"name": "latte"}, {"name": "muffin", "qty": 2}],
            "customer": "Ahmed",
            "paid": 15
        }"#;

        let guess: ParsedGuess = serde_json::from_str(json).unwrap();
        assert_eq!(guess.items[0].qty, 1); // qty defaults to 1
        assert_eq!(guess.items[1].qty, 2);
        assert_eq!(guess.paid, Some(15.0));
    }
}
