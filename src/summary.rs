// 📊 Summary Aggregator - Stateless recompute over the full row history
//
// No cached state: every snapshot is derived from a fresh full read of both
// tables. Calling it twice without intervening writes yields identical
// snapshots. "Today" filters compare the row's own calendar date with the
// caller-supplied date; no timezone games.

use crate::store::{Ledger, RowStore};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySnapshot {
    /// Sum of unit prices across all sale rows (each row = one unit).
    pub total_revenue: f64,
    /// Sum of amounts actually paid on sale rows.
    pub total_collected: f64,
    /// Sum of owed amounts on pending debt rows.
    pub total_outstanding: f64,
    /// Sum of owed amounts on settled debt rows.
    pub total_settled: f64,

    pub today_revenue: f64,
    pub today_collected: f64,
    /// Pending debt created today.
    pub today_outstanding: f64,
    /// Debt settled today (by settlement stamp).
    pub today_settled: f64,

    /// Number of sale rows - units, not customer interactions.
    pub transaction_count: usize,
    pub today_transactions: usize,
}

pub fn summarize<S: RowStore>(ledger: &mut Ledger<S>, today: NaiveDate) -> Result<SummarySnapshot> {
    let sales = ledger.sales()?;
    let debts = ledger.debts()?;

    let mut snapshot = SummarySnapshot {
        total_revenue: 0.0,
        total_collected: 0.0,
        total_outstanding: 0.0,
        total_settled: 0.0,
        today_revenue: 0.0,
        today_collected: 0.0,
        today_outstanding: 0.0,
        today_settled: 0.0,
        transaction_count: sales.len(),
        today_transactions: 0,
    };

    for sale in &sales {
        snapshot.total_revenue += sale.unit_price;
        snapshot.total_collected += sale.paid;
        if sale.date == today {
            snapshot.today_revenue += sale.unit_price;
            snapshot.today_collected += sale.paid;
            snapshot.today_transactions += 1;
        }
    }

    for (_, debt) in &debts {
        if debt.is_pending() {
            snapshot.total_outstanding += debt.owed;
            if debt.date == today {
                snapshot.today_outstanding += debt.owed;
            }
        } else {
            snapshot.total_settled += debt.owed;
            if debt.settled_on == Some(today) {
                snapshot.today_settled += debt.owed;
            }
        }
    }

    Ok(snapshot)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::store::{DebtRow, DebtStatus, MemoryStore, SaleRow, PAID_IN_FULL_NOTE};
    use chrono::NaiveTime;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn sale(date: NaiveDate, price: f64, paid: f64) -> SaleRow {
        SaleRow {
            date,
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            item: "latte".to_string(),
            category: Category::Coffee,
            unit_price: price,
            paid,
            owed: price - paid,
            note: PAID_IN_FULL_NOTE.to_string(),
        }
    }

    fn debt(date: NaiveDate, owed: f64, status: DebtStatus, settled_on: Option<NaiveDate>) -> DebtRow {
        DebtRow {
            date,
            customer: "Ahmed".to_string(),
            item: "latte".to_string(),
            unit_price: 15.0,
            paid: 15.0 - owed,
            owed,
            status,
            settled_on,
        }
    }

    #[test]
    fn test_totals_and_today_filters() {
        let mut ledger = Ledger::new(MemoryStore::new());

        // Two sales yesterday, one today
        ledger.append_sale(&sale(day(1), 15.0, 15.0)).unwrap();
        ledger.append_sale(&sale(day(1), 20.0, 10.0)).unwrap();
        ledger.append_sale(&sale(day(2), 12.0, 12.0)).unwrap();

        // One pending debt per day, one settled today
        ledger
            .append_debt(&debt(day(1), 10.0, DebtStatus::Pending, None))
            .unwrap();
        ledger
            .append_debt(&debt(day(2), 5.0, DebtStatus::Pending, None))
            .unwrap();
        ledger
            .append_debt(&debt(day(1), 7.0, DebtStatus::Settled, Some(day(2))))
            .unwrap();

        let snapshot = summarize(&mut ledger, day(2)).unwrap();

        assert_eq!(snapshot.total_revenue, 47.0);
        assert_eq!(snapshot.total_collected, 37.0);
        assert_eq!(snapshot.total_outstanding, 15.0);
        assert_eq!(snapshot.total_settled, 7.0);

        assert_eq!(snapshot.today_revenue, 12.0);
        assert_eq!(snapshot.today_collected, 12.0);
        assert_eq!(snapshot.today_outstanding, 5.0);
        assert_eq!(snapshot.today_settled, 7.0);

        assert_eq!(snapshot.transaction_count, 3);
        assert_eq!(snapshot.today_transactions, 1);
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut ledger = Ledger::new(MemoryStore::new());
        ledger.append_sale(&sale(day(2), 15.0, 15.0)).unwrap();
        ledger
            .append_debt(&debt(day(2), 5.0, DebtStatus::Pending, None))
            .unwrap();

        let first = summarize(&mut ledger, day(2)).unwrap();
        let second = summarize(&mut ledger, day(2)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_ledger_is_all_zeroes() {
        let mut ledger = Ledger::new(MemoryStore::new());
        let snapshot = summarize(&mut ledger, day(2)).unwrap();

        assert_eq!(snapshot.total_revenue, 0.0);
        assert_eq!(snapshot.total_outstanding, 0.0);
        assert_eq!(snapshot.transaction_count, 0);
    }
}
