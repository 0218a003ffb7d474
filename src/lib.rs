// Shopbook - Conversational bookkeeping engine
// Turns free-text or AI-extracted statements ("Ahmed got a latte, paid 15")
// into sale rows, partial-payment debts, and settlements against a fixed
// price catalog, plus running totals over the whole ledger.

pub mod assistant;
pub mod catalog;
pub mod heuristics;
pub mod intent;
pub mod parser;
pub mod recorder;
pub mod settlement;
pub mod store;
pub mod summary;

// Re-export commonly used types
pub use assistant::{Assistant, Reply};
pub use catalog::{Catalog, CatalogItem, Category};
pub use heuristics::{
    extract_paid_amount, infer_customer_from_text, infer_total_from_items,
    normalize_ambiguous_items,
};
pub use intent::{resolve_intent, IntentKind, LineItem, ResolvedIntent, ROUNDING_TOLERANCE};
pub use parser::{GuessItem, IntentParser, KeywordParser, ParsedGuess};
pub use recorder::{round2, RecordOutcome, RecordedLine, Recorder};
pub use settlement::{SettleOutcome, Settler};
pub use store::{
    DebtRow, DebtStatus, Ledger, MemoryStore, RowStore, SaleRow, SqliteStore, DEBTS_TABLE,
    PAID_IN_FULL_NOTE, SALES_TABLE,
};
pub use summary::{summarize, SummarySnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
