// 🧮 Transaction Recorder - Turn a resolved intent into ledger rows
//
// Sale: every unit fully paid, one sale row per unit.
// Debt: one payment split proportionally across items by their share of the
// total, then split per unit; each unit still owing gets a pending debt row.
//
// The returned total owed is the pre-split sum of item owed amounts, not a
// re-derivation from the rounded per-unit rows. Per-unit rounding drift is
// accepted for output compatibility.

use crate::catalog::Catalog;
use crate::intent::{IntentKind, ResolvedIntent};
use crate::store::{DebtRow, DebtStatus, Ledger, RowStore, SaleRow, PAID_IN_FULL_NOTE};
use anyhow::{bail, Result};
use chrono::{NaiveDate, NaiveTime};
use tracing::{info, warn};

/// Round to currency minor-unit precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// OUTCOME
// ============================================================================

/// One recorded line item (aggregated over its units).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedLine {
    pub item: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub paid: f64,
    pub owed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Rows were written.
    Recorded {
        lines: Vec<RecordedLine>,
        total: f64,
        total_owed: f64,
        warnings: Vec<String>,
        fully_paid: bool,
    },

    /// No line item resolved against the catalog. Not an error - nothing
    /// was written and the caller says so.
    NothingResolved { warnings: Vec<String> },

    /// Stated payment exceeds the bill. Operation-level rejection; zero
    /// rows were written.
    Overpaid { paid: f64, total: f64 },
}

// ============================================================================
// RECORDER
// ============================================================================

pub struct Recorder<'a, S: RowStore> {
    catalog: &'a Catalog,
    ledger: &'a mut Ledger<S>,
}

impl<'a, S: RowStore> Recorder<'a, S> {
    pub fn new(catalog: &'a Catalog, ledger: &'a mut Ledger<S>) -> Self {
        Recorder { catalog, ledger }
    }

    pub fn record(
        &mut self,
        intent: &ResolvedIntent,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<RecordOutcome> {
        match intent.kind {
            IntentKind::Sale => self.record_sale(intent, date, time),
            IntentKind::Debt => self.record_debt(intent, date, time),
            other => bail!("Recorder called with non-transaction intent '{}'", other.as_str()),
        }
    }

    /// Resolve line items against the catalog. Misses become warnings, not
    /// failures; processing continues with whatever resolves.
    fn resolve_items(
        &self,
        intent: &ResolvedIntent,
        warnings: &mut Vec<String>,
    ) -> Vec<(crate::catalog::CatalogItem, u32)> {
        let mut resolved = Vec::new();
        for line in &intent.line_items {
            match self.catalog.lookup(&line.item_key) {
                Some(entry) => resolved.push((entry.clone(), line.quantity.max(1))),
                None => {
                    warn!(item = %line.item_key, "item not in catalog, skipping");
                    warnings.push(format!("'{}' is not on the menu, skipped", line.item_key));
                }
            }
        }
        resolved
    }

    fn record_sale(
        &mut self,
        intent: &ResolvedIntent,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<RecordOutcome> {
        let mut warnings = Vec::new();
        let resolved = self.resolve_items(intent, &mut warnings);

        if resolved.is_empty() {
            return Ok(RecordOutcome::NothingResolved { warnings });
        }

        let mut lines = Vec::new();
        let mut total = 0.0;

        for (item, qty) in &resolved {
            for _ in 0..*qty {
                self.ledger.append_sale(&SaleRow {
                    date,
                    time,
                    item: item.name.clone(),
                    category: item.category,
                    unit_price: item.unit_price,
                    paid: item.unit_price,
                    owed: 0.0,
                    note: PAID_IN_FULL_NOTE.to_string(),
                })?;
            }

            let line_total = item.unit_price * *qty as f64;
            total += line_total;
            lines.push(RecordedLine {
                item: item.name.clone(),
                quantity: *qty,
                unit_price: item.unit_price,
                paid: line_total,
                owed: 0.0,
            });
        }

        info!(lines = lines.len(), total, "sale recorded");
        Ok(RecordOutcome::Recorded {
            lines,
            total,
            total_owed: 0.0,
            warnings,
            fully_paid: true,
        })
    }

    fn record_debt(
        &mut self,
        intent: &ResolvedIntent,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<RecordOutcome> {
        let mut warnings = Vec::new();
        let resolved = self.resolve_items(intent, &mut warnings);

        if resolved.is_empty() {
            return Ok(RecordOutcome::NothingResolved { warnings });
        }

        let total_item_price: f64 = resolved
            .iter()
            .map(|(item, qty)| item.unit_price * *qty as f64)
            .sum();
        let total_paid = intent.stated_paid.unwrap_or(0.0);

        // Guard before any write: an overpayment rejects the whole message.
        if total_paid > total_item_price {
            info!(total_paid, total_item_price, "overpayment rejected");
            return Ok(RecordOutcome::Overpaid {
                paid: total_paid,
                total: total_item_price,
            });
        }

        let customer = intent.customer.clone().unwrap_or_default();

        let mut lines = Vec::new();
        let mut total_owed = 0.0;

        for (item, qty) in &resolved {
            let item_total = item.unit_price * *qty as f64;

            // Proportional share of the payment for this item
            let item_paid = if total_item_price > 0.0 {
                round2(item_total / total_item_price * total_paid)
            } else {
                0.0
            };
            let item_owed = round2(item_total - item_paid);

            // Per-unit split
            let unit_paid = round2(item_paid / *qty as f64);
            let unit_owed = round2(item.unit_price - unit_paid);

            for _ in 0..*qty {
                self.ledger.append_sale(&SaleRow {
                    date,
                    time,
                    item: item.name.clone(),
                    category: item.category,
                    unit_price: item.unit_price,
                    paid: unit_paid,
                    owed: unit_owed,
                    note: customer.clone(),
                })?;

                if unit_owed > 0.0 {
                    self.ledger.append_debt(&DebtRow {
                        date,
                        customer: customer.clone(),
                        item: item.name.clone(),
                        unit_price: item.unit_price,
                        paid: unit_paid,
                        owed: unit_owed,
                        status: DebtStatus::Pending,
                        settled_on: None,
                    })?;
                }
            }

            total_owed += item_owed;
            lines.push(RecordedLine {
                item: item.name.clone(),
                quantity: *qty,
                unit_price: item.unit_price,
                paid: item_paid,
                owed: item_owed,
            });
        }

        let fully_paid = total_owed == 0.0;
        info!(
            customer = %customer,
            total = total_item_price,
            paid = total_paid,
            owed = total_owed,
            "debt recorded"
        );

        Ok(RecordOutcome::Recorded {
            lines,
            total: total_item_price,
            total_owed,
            warnings,
            fully_paid,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
