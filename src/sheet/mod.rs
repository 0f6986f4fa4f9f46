//! Ledger collaborator
//!
//! The spreadsheet-backed store is the sole source of truth for
//! persisted expenses; in-memory copies are transient. The store is a
//! remote resource with no transactional isolation, so the contract is
//! narrow: append rows, read everything, delete by position. Each
//! record's own timestamp establishes its logical time, not insertion
//! order.

use crate::error::Result;
use crate::models::ExpenseRecord;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fixed column order. The first row of a non-empty ledger is always
/// this header.
pub const HEADER: [&str; 7] = [
    "Full Time",
    "Ngày",
    "Tháng",
    "Năm",
    "Tên món",
    "Phân loại",
    "Số tiền",
];

/// One raw ledger row: seven cells in fixed column order. Rows are kept
/// as strings because the remote store has no schema; parsing happens
/// at scan time and bad rows are skipped, never fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<String>,
}

/// A row that parsed cleanly into the ledger schema.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub item: String,
    pub category: String,
    pub amount: i64,
}

impl Row {
    pub fn header() -> Self {
        Self {
            cells: HEADER.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_record(record: &ExpenseRecord) -> Self {
        let ts = record.timestamp;
        Self {
            cells: vec![
                ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                ts.format("%-d").to_string(),
                ts.format("%-m").to_string(),
                ts.format("%Y").to_string(),
                record.item.clone(),
                record.category.label().to_string(),
                record.amount.to_string(),
            ],
        }
    }

    /// Parse the day/month/year and amount columns. `None` for short
    /// rows or rows whose numeric cells do not parse; callers skip
    /// those without aborting the scan.
    pub fn entry(&self) -> Option<LedgerEntry> {
        if self.cells.len() < 7 {
            return None;
        }

        let day: u32 = self.cells[1].trim().parse().ok()?;
        let month: u32 = self.cells[2].trim().parse().ok()?;
        let year: i32 = self.cells[3].trim().parse().ok()?;
        let amount: i64 = self.cells[6].trim().parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;

        Some(LedgerEntry {
            date,
            item: self.cells[4].clone(),
            category: self.cells[5].clone(),
            amount,
        })
    }
}

/// Narrow persistence contract. Implementations own retry/transport
/// concerns; callers treat any error as fatal to the current message.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append one row per record, returning the records actually written.
    async fn append_records(&self, records: &[ExpenseRecord]) -> Result<Vec<ExpenseRecord>>;

    /// All rows in sheet order, header first. An empty vec is a valid
    /// "empty ledger", not an error.
    async fn read_all(&self) -> Result<Vec<Row>>;

    /// Delete the last row. Never removes the header; returns the
    /// deleted row, or `None` when only the header remains.
    async fn delete_last_row(&self) -> Result<Option<Row>>;

    /// Delete the row at a 0-based index into `read_all` output. The
    /// header (index 0) is refused.
    async fn delete_row_at(&self, index: usize) -> Result<Option<Row>>;
}

/// In-memory ledger for development and tests.
pub struct InMemorySheet {
    rows: Arc<RwLock<Vec<Row>>>,
}

impl InMemorySheet {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(vec![Row::header()])),
        }
    }
}

impl Default for InMemorySheet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemorySheet {
    async fn append_records(&self, records: &[ExpenseRecord]) -> Result<Vec<ExpenseRecord>> {
        let mut rows = self.rows.write().await;
        for record in records {
            rows.push(Row::from_record(record));
        }
        Ok(records.to_vec())
    }

    async fn read_all(&self) -> Result<Vec<Row>> {
        let rows = self.rows.read().await;
        Ok(rows.clone())
    }

    async fn delete_last_row(&self) -> Result<Option<Row>> {
        let mut rows = self.rows.write().await;
        if rows.len() <= 1 {
            return Ok(None);
        }
        Ok(rows.pop())
    }

    async fn delete_row_at(&self, index: usize) -> Result<Option<Row>> {
        let mut rows = self.rows.write().await;
        if index == 0 || index >= rows.len() {
            return Ok(None);
        }
        Ok(Some(rows.remove(index)))
    }
}

/// Undo: delete the last data row and report what was removed. `None`
/// when the ledger is empty or the last row carries no item name.
pub async fn undo_last(store: &dyn LedgerStore) -> Result<Option<LedgerEntry>> {
    let rows = store.read_all().await?;
    if rows.len() <= 1 {
        return Ok(None);
    }

    let last = &rows[rows.len() - 1];
    if last.cells.len() < 7 || last.cells[4].is_empty() {
        return Ok(None);
    }

    let entry = last.entry();
    store.delete_last_row().await?;
    Ok(entry)
}

/// A row matched by fuzzy name lookup, pending explicit confirmation
/// before it is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDeletion {
    /// Index into `read_all` output (header included).
    pub index: usize,
    pub entry: LedgerEntry,
}

/// Case-insensitive substring lookup over item names, most recent
/// first. The caller must show the match and get a yes/no before
/// calling [`confirm_deletion`].
pub async fn find_rows_by_name(store: &dyn LedgerStore, name: &str) -> Result<Vec<PendingDeletion>> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let rows = store.read_all().await?;
    let mut matches = Vec::new();

    for (index, row) in rows.iter().enumerate().skip(1) {
        if let Some(entry) = row.entry() {
            if entry.item.to_lowercase().contains(&needle) {
                matches.push(PendingDeletion { index, entry });
            }
        }
    }

    matches.reverse();
    Ok(matches)
}

/// Second step of delete-by-name: remove the confirmed row.
pub async fn confirm_deletion(
    store: &dyn LedgerStore,
    pending: &PendingDeletion,
) -> Result<Option<Row>> {
    store.delete_row_at(pending.index).await
}
