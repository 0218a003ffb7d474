// 🎯 Intent Resolver - Merge the AI guess with deterministic heuristics
//
// One canonical `ResolvedIntent` per incoming message. The parsed guess is a
// hint; the heuristics run over the raw text and can backfill or, for the
// sale/debt boundary, overrule it: a stated partial payment contradicts a
// "full sale" label no matter what the parser guessed.

use crate::catalog::Catalog;
use crate::heuristics::{
    extract_paid_amount, infer_customer_from_text, infer_total_from_items,
    normalize_ambiguous_items,
};
use crate::parser::ParsedGuess;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tolerance for currency comparisons (minor-unit rounding).
pub const ROUNDING_TOLERANCE: f64 = 0.01;

// ============================================================================
// INTENT KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentKind {
    Sale,
    Debt,
    Settle,
    Summary,
    ListDebts,
    ShowMenu,
    Help,
    ClearAll,
    Unknown,
}

impl IntentKind {
    /// Map the external parser's free-form label onto a kind.
    /// Anything unrecognized is `Unknown`, never an error.
    pub fn from_label(label: &str) -> IntentKind {
        match label.trim().to_lowercase().as_str() {
            "sale" | "sell" | "sold" => IntentKind::Sale,
            "debt" | "credit" | "partial" => IntentKind::Debt,
            "settle" | "settlement" => IntentKind::Settle,
            "summary" => IntentKind::Summary,
            "list_debts" | "debts" => IntentKind::ListDebts,
            "show_menu" | "menu" => IntentKind::ShowMenu,
            "help" => IntentKind::Help,
            "clear_all" | "clear" => IntentKind::ClearAll,
            _ => IntentKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Sale => "sale",
            IntentKind::Debt => "debt",
            IntentKind::Settle => "settle",
            IntentKind::Summary => "summary",
            IntentKind::ListDebts => "list_debts",
            IntentKind::ShowMenu => "show_menu",
            IntentKind::Help => "help",
            IntentKind::ClearAll => "clear_all",
            IntentKind::Unknown => "unknown",
        }
    }
}

// ============================================================================
// RESOLVED INTENT
// ============================================================================

/// One line of a transaction: canonical-ish item key + quantity (always >= 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_key: String,
    pub quantity: u32,
}

/// The canonical, de-ambiguated action for one message. Produced fresh per
/// message, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIntent {
    pub kind: IntentKind,
    pub line_items: Vec<LineItem>,
    pub customer: Option<String>,
    pub stated_paid: Option<f64>,
    /// Deterministic catalog total for the (normalized) item list.
    pub inferred_total: f64,
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Merge the parsed guess with heuristic signals from the raw text.
///
/// Order matters:
/// 1. normalize ambiguous item names against the raw text
/// 2. settle the explicit paid amount (parser wins unless the text says
///    "paid nothing"; an explicit zero beats a guessed number)
/// 3. backfill the customer
/// 4. compute the deterministic total
/// 5. reclassify Sale -> Debt when the stated payment under-covers it
pub fn resolve_intent(catalog: &Catalog, text: &str, guess: Option<ParsedGuess>) -> ResolvedIntent {
    let Some(guess) = guess else {
        // Parser had nothing; keep the heuristic signals so the caller can
        // still say something useful.
        return ResolvedIntent {
            kind: IntentKind::Unknown,
            line_items: Vec::new(),
            customer: infer_customer_from_text(text),
            stated_paid: extract_paid_amount(text),
            inferred_total: 0.0,
        };
    };

    let items = normalize_ambiguous_items(catalog, &guess.items, text);

    let heuristic_paid = extract_paid_amount(text);
    let stated_paid = if heuristic_paid == Some(0.0) {
        // Explicit zero-payment phrasing overrides any guessed amount
        Some(0.0)
    } else {
        guess.paid.or(heuristic_paid)
    };

    let customer = guess
        .customer
        .filter(|c| !c.trim().is_empty())
        .or_else(|| infer_customer_from_text(text));

    let inferred_total = infer_total_from_items(catalog, &items);

    let mut kind = IntentKind::from_label(&guess.intent);
    if kind == IntentKind::Sale {
        if let Some(paid) = stated_paid {
            if inferred_total > 0.0 && paid < inferred_total - ROUNDING_TOLERANCE {
                debug!(paid, inferred_total, "stated payment under-covers total, reclassifying sale as debt");
                kind = IntentKind::Debt;
            }
        }
    }

    ResolvedIntent {
        kind,
        line_items: items
            .into_iter()
            .map(|g| LineItem {
                item_key: g.name,
                quantity: g.qty.max(1),
            })
            .collect(),
        customer,
        stated_paid,
        inferred_total,
    }
}

// ============================================================================
// TESTS
// ============================================================================
