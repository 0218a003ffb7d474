// 🗄️ Row Store - Ledger rows, wire layout, and store implementations
//
// The persistent store is a dumb tabular thing: append-only rows, targeted
// cell updates, full-range reads, header row first. Everything the engine
// knows about it goes through the narrow `RowStore` trait; `Ledger` layers
// the typed row encoding on top.
//
// Column order per table is a wire contract with the store. Do not reorder
// without a migration:
//   sales = [date, time, item, category, price, paid, owed, note]
//   debts = [date, customer, item, price, paid, owed, status, settled_on]

use crate::catalog::Category;
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

pub const SALES_TABLE: &str = "sales";
pub const DEBTS_TABLE: &str = "debts";

pub const SALES_HEADER: [&str; 8] = [
    "date", "time", "item", "category", "price", "paid", "owed", "note",
];
pub const DEBTS_HEADER: [&str; 8] = [
    "date", "customer", "item", "price", "paid", "owed", "status", "settled_on",
];

/// Note literal written on fully paid sale rows.
pub const PAID_IN_FULL_NOTE: &str = "paid in full";

const DEBT_STATUS_COL: usize = 6;
const DEBT_SETTLED_COL: usize = 7;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";

// ============================================================================
// ROW TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtStatus {
    Pending,
    Settled,
}

impl DebtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStatus::Pending => "Pending",
            DebtStatus::Settled => "Settled",
        }
    }

    pub fn from_label(label: &str) -> Option<DebtStatus> {
        match label.trim().to_lowercase().as_str() {
            "pending" => Some(DebtStatus::Pending),
            "settled" => Some(DebtStatus::Settled),
            _ => None,
        }
    }
}

/// One physical unit sold. `paid + owed == unit_price` within rounding
/// tolerance on every row.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRow {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub item: String,
    pub category: Category,
    pub unit_price: f64,
    pub paid: f64,
    pub owed: f64,
    /// Customer name for partial payments, or the paid-in-full literal.
    pub note: String,
}

impl SaleRow {
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.date.format(DATE_FMT).to_string(),
            self.time.format(TIME_FMT).to_string(),
            self.item.clone(),
            self.category.as_str().to_string(),
            format!("{:.2}", self.unit_price),
            format!("{:.2}", self.paid),
            format!("{:.2}", self.owed),
            self.note.clone(),
        ]
    }

    pub fn from_cells(cells: &[String]) -> Option<SaleRow> {
        if cells.len() < 8 {
            return None;
        }
        Some(SaleRow {
            date: NaiveDate::parse_from_str(&cells[0], DATE_FMT).ok()?,
            time: NaiveTime::parse_from_str(&cells[1], TIME_FMT).ok()?,
            item: cells[2].clone(),
            category: Category::from_label(&cells[3]),
            unit_price: cells[4].parse().ok()?,
            paid: cells[5].parse().ok()?,
            owed: cells[6].parse().ok()?,
            note: cells[7].clone(),
        })
    }
}

/// One unit owed. Created Pending; settlement is the only transition.
#[derive(Debug, Clone, PartialEq)]
pub struct DebtRow {
    pub date: NaiveDate,
    pub customer: String,
    pub item: String,
    pub unit_price: f64,
    pub paid: f64,
    pub owed: f64,
    pub status: DebtStatus,
    pub settled_on: Option<NaiveDate>,
}

impl DebtRow {
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.date.format(DATE_FMT).to_string(),
            self.customer.clone(),
            self.item.clone(),
            format!("{:.2}", self.unit_price),
            format!("{:.2}", self.paid),
            format!("{:.2}", self.owed),
            self.status.as_str().to_string(),
            self.settled_on
                .map(|d| d.format(DATE_FMT).to_string())
                .unwrap_or_default(),
        ]
    }

    pub fn from_cells(cells: &[String]) -> Option<DebtRow> {
        if cells.len() < 8 {
            return None;
        }
        let settled_on = if cells[7].trim().is_empty() {
            None
        } else {
            Some(NaiveDate::parse_from_str(&cells[7], DATE_FMT).ok()?)
        };
        Some(DebtRow {
            date: NaiveDate::parse_from_str(&cells[0], DATE_FMT).ok()?,
            customer: cells[1].clone(),
            item: cells[2].clone(),
            unit_price: cells[3].parse().ok()?,
            paid: cells[4].parse().ok()?,
            owed: cells[5].parse().ok()?,
            status: DebtStatus::from_label(&cells[6])?,
            settled_on,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == DebtStatus::Pending
    }
}

// ============================================================================
// ROW STORE TRAIT
// ============================================================================

/// The narrow contract with the tabular store. Rows are ordered by
/// insertion; `read_all` returns the header row first; indices passed to
/// `update_cell` index into that same sequence. Each row write is atomic;
/// multi-row operations are not (no rollback on a mid-write failure).
pub trait RowStore {
    /// Create the table and seed its header row if missing. Idempotent.
    fn ensure_table(&mut self, table: &str, header: &[&str]) -> Result<()>;

    fn append_row(&mut self, table: &str, cells: &[String]) -> Result<()>;

    fn read_all(&self, table: &str) -> Result<Vec<Vec<String>>>;

    fn update_cell(
        &mut self,
        table: &str,
        row_index: usize,
        col_index: usize,
        value: &str,
    ) -> Result<()>;

    /// Bulk clear: delete every data row, keep the header.
    fn clear_data_rows(&mut self, table: &str) -> Result<()>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Vec-backed store. Test double and throwaway-session backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl RowStore for MemoryStore {
    fn ensure_table(&mut self, table: &str, header: &[&str]) -> Result<()> {
        let rows = self.tables.entry(table.to_string()).or_default();
        if rows.is_empty() {
            rows.push(header.iter().map(|s| s.to_string()).collect());
        }
        Ok(())
    }

    fn append_row(&mut self, table: &str, cells: &[String]) -> Result<()> {
        match self.tables.get_mut(table) {
            Some(rows) => {
                rows.push(cells.to_vec());
                Ok(())
            }
            None => bail!("Table '{}' does not exist", table),
        }
    }

    fn read_all(&self, table: &str) -> Result<Vec<Vec<String>>> {
        self.tables
            .get(table)
            .cloned()
            .with_context(|| format!("Table '{}' does not exist", table))
    }

    fn update_cell(
        &mut self,
        table: &str,
        row_index: usize,
        col_index: usize,
        value: &str,
    ) -> Result<()> {
        let rows = self
            .tables
            .get_mut(table)
            .with_context(|| format!("Table '{}' does not exist", table))?;
        let row = rows
            .get_mut(row_index)
            .with_context(|| format!("Row {} out of range in '{}'", row_index, table))?;
        let cell = row
            .get_mut(col_index)
            .with_context(|| format!("Column {} out of range in '{}'", col_index, table))?;
        *cell = value.to_string();
        Ok(())
    }

    fn clear_data_rows(&mut self, table: &str) -> Result<()> {
        if let Some(rows) = self.tables.get_mut(table) {
            rows.truncate(1);
        }
        Ok(())
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// SQLite-backed store. Each logical table is a two-column table of
/// (rowid, JSON cell array); insertion order is the rowid order.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open ledger db: {}", path.as_ref().display()))?;
        Ok(SqliteStore { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory db")?;
        Ok(SqliteStore { conn })
    }

    /// Table names come from our own constants, but quoting identifiers into
    /// SQL still warrants a whitelist check.
    fn table_ident(table: &str) -> Result<String> {
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            bail!("Invalid table name: '{}'", table);
        }
        Ok(format!("t_{}", table))
    }
}

impl RowStore for SqliteStore {
    fn ensure_table(&mut self, table: &str, header: &[&str]) -> Result<()> {
        let ident = Self::table_ident(table)?;

        self.conn
            .execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        cells TEXT NOT NULL
                    )",
                    ident
                ),
                [],
            )
            .with_context(|| format!("Failed to create table '{}'", table))?;

        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", ident), [], |r| r.get(0))?;

        if count == 0 {
            let cells: Vec<String> = header.iter().map(|s| s.to_string()).collect();
            let json = serde_json::to_string(&cells)?;
            self.conn.execute(
                &format!("INSERT INTO {} (cells) VALUES (?1)", ident),
                params![json],
            )?;
            debug!(table, "seeded header row");
        }

        Ok(())
    }

    fn append_row(&mut self, table: &str, cells: &[String]) -> Result<()> {
        let ident = Self::table_ident(table)?;
        let json = serde_json::to_string(cells)?;
        self.conn
            .execute(
                &format!("INSERT INTO {} (cells) VALUES (?1)", ident),
                params![json],
            )
            .with_context(|| format!("Failed to append row to '{}'", table))?;
        Ok(())
    }

    fn read_all(&self, table: &str) -> Result<Vec<Vec<String>>> {
        let ident = Self::table_ident(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT cells FROM {} ORDER BY id", ident))
            .with_context(|| format!("Failed to read table '{}'", table))?;

        let json_rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut rows = Vec::new();
        for json in json_rows {
            let json = json?;
            let cells: Vec<String> = serde_json::from_str(&json)
                .with_context(|| format!("Corrupt row in '{}': {}", table, json))?;
            rows.push(cells);
        }
        Ok(rows)
    }

    fn update_cell(
        &mut self,
        table: &str,
        row_index: usize,
        col_index: usize,
        value: &str,
    ) -> Result<()> {
        let ident = Self::table_ident(table)?;

        let id: i64 = self
            .conn
            .query_row(
                &format!("SELECT id FROM {} ORDER BY id LIMIT 1 OFFSET ?1", ident),
                params![row_index as i64],
                |r| r.get(0),
            )
            .with_context(|| format!("Row {} not found in '{}'", row_index, table))?;

        let json: String = self.conn.query_row(
            &format!("SELECT cells FROM {} WHERE id = ?1", ident),
            params![id],
            |r| r.get(0),
        )?;

        let mut cells: Vec<String> = serde_json::from_str(&json)?;
        if col_index >= cells.len() {
            bail!("Column {} out of range in '{}'", col_index, table);
        }
        cells[col_index] = value.to_string();

        self.conn.execute(
            &format!("UPDATE {} SET cells = ?1 WHERE id = ?2", ident),
            params![serde_json::to_string(&cells)?, id],
        )?;
        Ok(())
    }

    fn clear_data_rows(&mut self, table: &str) -> Result<()> {
        let ident = Self::table_ident(table)?;
        self.conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE id > (SELECT MIN(id) FROM {})",
                    ident, ident
                ),
                [],
            )
            .with_context(|| format!("Failed to clear table '{}'", table))?;
        Ok(())
    }
}

// ============================================================================
// TYPED LEDGER FACADE
// ============================================================================

/// Typed view over a `RowStore`: encodes/decodes rows per the wire layout
/// and lazily ensures both tables before first use. Rows that fail to
/// decode are skipped with a warning, never a crash.
pub struct Ledger<S: RowStore> {
    store: S,
    tables_ready: bool,
}

impl<S: RowStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Ledger {
            store,
            tables_ready: false,
        }
    }

    fn ensure_tables(&mut self) -> Result<()> {
        if !self.tables_ready {
            self.store.ensure_table(SALES_TABLE, &SALES_HEADER)?;
            self.store.ensure_table(DEBTS_TABLE, &DEBTS_HEADER)?;
            self.tables_ready = true;
        }
        Ok(())
    }

    pub fn append_sale(&mut self, row: &SaleRow) -> Result<()> {
        self.ensure_tables()?;
        self.store
            .append_row(SALES_TABLE, &row.to_cells())
            .context("Failed to write sale row")?;
        debug!(item = %row.item, paid = row.paid, owed = row.owed, "sale row appended");
        Ok(())
    }

    pub fn append_debt(&mut self, row: &DebtRow) -> Result<()> {
        self.ensure_tables()?;
        self.store
            .append_row(DEBTS_TABLE, &row.to_cells())
            .context("Failed to write debt row")?;
        debug!(customer = %row.customer, item = %row.item, owed = row.owed, "debt row appended");
        Ok(())
    }

    /// All sale rows, in insertion order.
    pub fn sales(&mut self) -> Result<Vec<SaleRow>> {
        self.ensure_tables()?;
        let raw = self.store.read_all(SALES_TABLE)?;
        Ok(raw
            .iter()
            .skip(1) // header
            .filter_map(|cells| {
                let row = SaleRow::from_cells(cells);
                if row.is_none() {
                    warn!(?cells, "skipping unreadable sale row");
                }
                row
            })
            .collect())
    }

    /// All debt rows with their row index in the stored sequence (the index
    /// the store expects for cell updates). Insertion order.
    pub fn debts(&mut self) -> Result<Vec<(usize, DebtRow)>> {
        self.ensure_tables()?;
        let raw = self.store.read_all(DEBTS_TABLE)?;
        Ok(raw
            .iter()
            .enumerate()
            .skip(1) // header
            .filter_map(|(index, cells)| {
                let row = DebtRow::from_cells(cells);
                if row.is_none() {
                    warn!(index, ?cells, "skipping unreadable debt row");
                }
                row.map(|r| (index, r))
            })
            .collect())
    }

    /// Flip one debt row to Settled and stamp the settlement date.
    pub fn settle_debt(&mut self, row_index: usize, on: NaiveDate) -> Result<()> {
        self.ensure_tables()?;
        self.store.update_cell(
            DEBTS_TABLE,
            row_index,
            DEBT_STATUS_COL,
            DebtStatus::Settled.as_str(),
        )?;
        self.store.update_cell(
            DEBTS_TABLE,
            row_index,
            DEBT_SETTLED_COL,
            &on.format(DATE_FMT).to_string(),
        )?;
        info!(row_index, on = %on, "debt row settled");
        Ok(())
    }

    /// Bulk clear of both tables (headers survive).
    pub fn clear_all(&mut self) -> Result<()> {
        self.ensure_tables()?;
        self.store.clear_data_rows(SALES_TABLE)?;
        self.store.clear_data_rows(DEBTS_TABLE)?;
        info!("ledger cleared");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
