//! Budget evaluator
//!
//! Week-to-date spend against a fixed weekly ceiling, always derived
//! from a full ledger scan at query time. There is no cached running
//! total: the ledger is small and the store is the sole source of
//! truth. Rows that fail to parse are skipped, never fatal.

use crate::error::Result;
use crate::models::{ExpenseReport, WeeklyBudgetSnapshot};
use crate::sheet::LedgerStore;
use chrono::{Datelike, Duration, Local, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Default weekly ceiling: 700k VND.
pub const DEFAULT_WEEKLY_LIMIT: i64 = 700_000;

/// How many recent transactions the financial context quotes.
const CONTEXT_RECENT_COUNT: usize = 5;

/// Monday 00:00:00 through Sunday 23:59:59 of the week containing
/// `now`, local wall-clock.
pub fn week_bounds(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let days_since_monday = now.weekday().num_days_from_monday() as i64;
    let monday = (now - Duration::days(days_since_monday))
        .date()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid");
    let sunday = (monday + Duration::days(6))
        .date()
        .and_hms_opt(23, 59, 59)
        .expect("23:59:59 is always valid");
    (monday, sunday)
}

pub struct BudgetEvaluator {
    store: Arc<dyn LedgerStore>,
    weekly_limit: i64,
}

impl BudgetEvaluator {
    pub fn new(store: Arc<dyn LedgerStore>, weekly_limit: i64) -> Self {
        Self {
            store,
            weekly_limit,
        }
    }

    pub fn weekly_limit(&self) -> i64 {
        self.weekly_limit
    }

    /// Recompute the current week's spend from the full ledger.
    pub async fn weekly_snapshot(&self) -> Result<WeeklyBudgetSnapshot> {
        self.weekly_snapshot_at(Local::now().naive_local()).await
    }

    pub async fn weekly_snapshot_at(&self, now: NaiveDateTime) -> Result<WeeklyBudgetSnapshot> {
        let (monday, sunday) = week_bounds(now);

        let rows = self.store.read_all().await?;
        let mut total_spent = 0i64;

        for row in rows.iter().skip(1) {
            let Some(entry) = row.entry() else { continue };
            let row_time = entry
                .date
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always valid");
            if monday <= row_time && row_time <= sunday {
                total_spent += entry.amount;
            }
        }

        let remaining = self.weekly_limit - total_spent;
        let percent_used = if self.weekly_limit > 0 {
            total_spent as f64 / self.weekly_limit as f64 * 100.0
        } else {
            0.0
        };

        info!(total_spent, remaining, percent_used, "weekly budget recomputed");

        Ok(WeeklyBudgetSnapshot {
            week_start: monday,
            week_end: sunday,
            total_spent,
            remaining,
            percent_used,
        })
    }

    /// Today/month totals plus the top five category totals for the
    /// current month.
    pub async fn expense_report(&self) -> Result<ExpenseReport> {
        self.expense_report_at(Local::now().naive_local()).await
    }

    pub async fn expense_report_at(&self, now: NaiveDateTime) -> Result<ExpenseReport> {
        let today = now.date();
        let rows = self.store.read_all().await?;

        let mut today_total = 0i64;
        let mut month_total = 0i64;
        let mut category_totals: HashMap<String, i64> = HashMap::new();

        for row in rows.iter().skip(1) {
            let Some(entry) = row.entry() else { continue };

            if entry.date == today {
                today_total += entry.amount;
            }
            if entry.date.month() == today.month() && entry.date.year() == today.year() {
                month_total += entry.amount;
                *category_totals.entry(entry.category).or_insert(0) += entry.amount;
            }
        }

        let mut top_categories: Vec<(String, i64)> = category_totals.into_iter().collect();
        top_categories.sort_by(|a, b| b.1.cmp(&a.1));
        top_categories.truncate(5);

        Ok(ExpenseReport {
            today_total,
            month_total,
            top_categories,
        })
    }

    /// Live textual summary injected into the Tier 1 prompt so the
    /// model can reference real figures.
    pub async fn financial_context(&self) -> Result<String> {
        self.financial_context_at(Local::now().naive_local()).await
    }

    pub async fn financial_context_at(&self, now: NaiveDateTime) -> Result<String> {
        let report = self.expense_report_at(now).await?;
        let snapshot = self.weekly_snapshot_at(now).await?;

        let rows = self.store.read_all().await?;
        let recent: Vec<_> = rows
            .iter()
            .skip(1)
            .filter_map(|r| r.entry())
            .filter(|e| e.amount > 0)
            .collect();

        let mut lines = Vec::new();
        for (i, entry) in recent.iter().rev().take(CONTEXT_RECENT_COUNT).enumerate() {
            lines.push(format!(
                "  {}. {}: {}đ ({}) - {}/{}/{}",
                i + 1,
                entry.item,
                entry.amount,
                entry.category,
                entry.date.day(),
                entry.date.month(),
                entry.date.year(),
            ));
        }
        if lines.is_empty() {
            lines.push("  Không có giao dịch nào.".to_string());
        }

        Ok(format!(
            "DỮ LIỆU TÀI CHÍNH THỰC TẾ (Cập nhật lúc {}):\n\
             - Hôm nay ({}): Đã tiêu {}đ.\n\
             - Tháng này: {}đ.\n\
             - Ngân sách tuần: Còn dư {}đ.\n\
             - {} giao dịch gần nhất:\n{}",
            now.format("%H:%M:%S"),
            now.format("%d/%m/%Y"),
            report.today_total,
            report.month_total,
            snapshot.remaining,
            CONTEXT_RECENT_COUNT,
            lines.join("\n"),
        ))
    }

    /// Context used when the ledger cannot be read; always succeeds so
    /// Tier 1 keeps working without live figures.
    pub fn default_context(&self, now: NaiveDateTime) -> String {
        format!(
            "DỮ LIỆU TÀI CHÍNH THỰC TẾ (Cập nhật lúc {}):\n\
             - Hôm nay ({}): Đã tiêu 0đ.\n\
             - Tháng này: 0đ.\n\
             - Ngân sách tuần: Còn dư {}đ.\n\
             - {} giao dịch gần nhất: Không có dữ liệu.",
            now.format("%H:%M:%S"),
            now.format("%d/%m/%Y"),
            self.weekly_limit,
            CONTEXT_RECENT_COUNT,
        )
    }
}
