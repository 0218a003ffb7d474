// ⚖️ Settlement Engine - First-fit settlement of pending debts
//
// Debt rows are visited strictly in stored (insertion) order. With a cap, a
// row settles only when the running settled amount plus its owed amount
// still fits; rows that don't fit are skipped, even if a later smaller row
// would have fit better. No sorting, no best-fit. This ordering is part of
// the observable behavior.

use crate::intent::ROUNDING_TOLERANCE;
use crate::store::{Ledger, RowStore};
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct SettleOutcome {
    pub settled_amount: f64,
    pub settled_count: usize,
}

impl SettleOutcome {
    /// False means "no pending debt matched" - an informational outcome,
    /// not an error.
    pub fn found_any(&self) -> bool {
        self.settled_count > 0
    }
}

pub struct Settler<'a, S: RowStore> {
    ledger: &'a mut Ledger<S>,
}

impl<'a, S: RowStore> Settler<'a, S> {
    pub fn new(ledger: &'a mut Ledger<S>) -> Self {
        Settler { ledger }
    }

    /// Settle pending debts for a customer, oldest-stored first, up to an
    /// optional cap. Customer match is case-insensitive exact.
    pub fn settle(
        &mut self,
        customer: &str,
        cap: Option<f64>,
        today: NaiveDate,
    ) -> Result<SettleOutcome> {
        let target = customer.trim();
        let rows = self.ledger.debts()?;

        let mut running_settled = 0.0;
        let mut settled_count = 0;

        for (row_index, debt) in rows {
            if !debt.is_pending() {
                continue;
            }
            if !debt.customer.trim().eq_ignore_ascii_case(target) {
                continue;
            }

            if let Some(cap) = cap {
                if running_settled + debt.owed > cap + ROUNDING_TOLERANCE {
                    debug!(row_index, owed = debt.owed, running_settled, cap, "row does not fit cap, skipping");
                    continue;
                }
            }

            self.ledger.settle_debt(row_index, today)?;
            running_settled += debt.owed;
            settled_count += 1;
        }

        info!(
            customer = %target,
            settled_amount = running_settled,
            settled_count,
            "settlement pass finished"
        );

        Ok(SettleOutcome {
            settled_amount: running_settled,
            settled_count,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DebtRow, DebtStatus, MemoryStore};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
    }

    fn debt(customer: &str, owed: f64) -> DebtRow {
        DebtRow {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            customer: customer.to_string(),
            item: "latte".to_string(),
            unit_price: owed,
            paid: 0.0,
            owed,
            status: DebtStatus::Pending,
            settled_on: None,
        }
    }

    fn ledger_with(debts: &[DebtRow]) -> Ledger<MemoryStore> {
        let mut ledger = Ledger::new(MemoryStore::new());
        for d in debts {
            ledger.append_debt(d).unwrap();
        }
        ledger
    }

    #[test]
    fn test_capped_settlement_is_first_fit_in_stored_order() {
        // Debts 10, 8, 6 with cap 14: the 10 settles; 8 doesn't fit
        // (10 + 8 > 14); 6 doesn't fit either (10 + 6 > 14). Strict
        // insertion-order first-fit, not best-fit.
        let mut ledger = ledger_with(&[debt("X", 10.0), debt("X", 8.0), debt("X", 6.0)]);

        let outcome = Settler::new(&mut ledger)
            .settle("X", Some(14.0), today())
            .unwrap();

        assert_eq!(outcome.settled_amount, 10.0);
        assert_eq!(outcome.settled_count, 1);

        let rows = ledger.debts().unwrap();
        assert_eq!(rows[0].1.status, DebtStatus::Settled);
        assert_eq!(rows[0].1.settled_on, Some(today()));
        assert_eq!(rows[1].1.status, DebtStatus::Pending);
        assert_eq!(rows[2].1.status, DebtStatus::Pending);
    }

    #[test]
    fn test_capped_settlement_takes_later_rows_that_fit() {
        // Debts 10, 3 with cap 14: both fit (10, then 10 + 3 <= 14)
        let mut ledger = ledger_with(&[debt("X", 10.0), debt("X", 3.0)]);

        let outcome = Settler::new(&mut ledger)
            .settle("X", Some(14.0), today())
            .unwrap();

        assert_eq!(outcome.settled_amount, 13.0);
        assert_eq!(outcome.settled_count, 2);
    }

    #[test]
    fn test_uncapped_settles_everything_pending() {
        let mut ledger = ledger_with(&[debt("X", 10.0), debt("Y", 4.0), debt("X", 6.0)]);

        let outcome = Settler::new(&mut ledger).settle("X", None, today()).unwrap();

        assert_eq!(outcome.settled_amount, 16.0);
        assert_eq!(outcome.settled_count, 2);

        // Y untouched
        let rows = ledger.debts().unwrap();
        assert_eq!(rows[1].1.customer, "Y");
        assert_eq!(rows[1].1.status, DebtStatus::Pending);
    }

    #[test]
    fn test_customer_match_is_case_insensitive() {
        let mut ledger = ledger_with(&[debt("Ahmed", 5.0)]);

        let outcome = Settler::new(&mut ledger)
            .settle("AHMED", None, today())
            .unwrap();

        assert_eq!(outcome.settled_amount, 5.0);
        assert!(outcome.found_any());
    }

    #[test]
    fn test_already_settled_rows_are_skipped() {
        let mut settled = debt("X", 5.0);
        settled.status = DebtStatus::Settled;
        settled.settled_on = Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

        let mut ledger = ledger_with(&[settled, debt("X", 7.0)]);

        let outcome = Settler::new(&mut ledger).settle("X", None, today()).unwrap();
        assert_eq!(outcome.settled_amount, 7.0);
        assert_eq!(outcome.settled_count, 1);
    }

    #[test]
    fn test_no_matching_debt_is_zero_outcome() {
        let mut ledger = ledger_with(&[debt("Ahmed", 5.0)]);

        let outcome = Settler::new(&mut ledger).settle("Mona", None, today()).unwrap();
        assert_eq!(outcome.settled_amount, 0.0);
        assert!(!outcome.found_any());
    }

    #[test]
    fn test_cap_tolerance_allows_rounding_slack() {
        // Cap 9.99 vs owed 10.00: inside the 0.01 tolerance
        let mut ledger = ledger_with(&[debt("X", 10.0)]);

        let outcome = Settler::new(&mut ledger)
            .settle("X", Some(9.99), today())
            .unwrap();
        assert_eq!(outcome.settled_amount, 10.0);
    }
}
