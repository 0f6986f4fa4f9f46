//! Core data models for the expense agent

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Category =================
//

/// Closed category set. The ledger stores the Vietnamese display label,
/// so serialization round-trips through `label()` / `from_label()`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Transport,
    Education,
    Other,
}

impl Category {
    /// Label as written into the ledger (and spoken back to the user).
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Ăn uống",
            Category::Transport => "Di chuyển",
            Category::Education => "Học tập",
            Category::Other => "Khác",
        }
    }

    /// Parse a label back into the enum. Unknown labels map to `None`;
    /// callers decide whether that means `Other` or a skipped row.
    pub fn from_label(label: &str) -> Option<Category> {
        match label.trim() {
            "Ăn uống" => Some(Category::Food),
            "Di chuyển" => Some(Category::Transport),
            "Học tập" => Some(Category::Education),
            "Khác" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn all() -> [Category; 4] {
        [
            Category::Food,
            Category::Transport,
            Category::Education,
            Category::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

//
// ================= Expense Records =================
//

/// One persisted expense. Immutable once written; removed only via the
/// explicit undo/delete operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    pub item: String,
    /// Minor currency unit (VND), always positive.
    pub amount: i64,
    pub category: Category,
    /// Local wall-clock time; backdated entries carry the stated day at 12:00.
    pub timestamp: NaiveDateTime,
}

/// An expense as extracted by either parser tier, before its timestamp
/// is resolved at persistence time.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub item: String,
    pub amount: i64,
    pub category: Category,
    /// Backdated date stated by the user, if any.
    pub date: Option<NaiveDate>,
}

impl ExpenseDraft {
    /// Resolve into a record. A stated date becomes that day at noon,
    /// otherwise `now` is used as-is.
    pub fn into_record(self, now: NaiveDateTime) -> ExpenseRecord {
        let timestamp = self
            .date
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap_or(now);

        ExpenseRecord {
            item: self.item,
            amount: self.amount,
            category: self.category,
            timestamp,
        }
    }
}

//
// ================= Amount Lexing =================
//

/// Transient amount candidate produced by the lexer; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountCandidate {
    pub value: i64,
    /// Byte offsets of the matched text in the source clause.
    pub span: (usize, usize),
}

//
// ================= Tier 1 Output =================
//

/// Validated Tier 1 output. Exactly one variant per call; the tag
/// drives routing. The `Expense` variant never carries an empty list;
/// the validating constructor fails instead, forcing the fallback tier.
#[derive(Debug, Clone, PartialEq)]
pub enum IntentResult {
    Expense {
        items: Vec<ExpenseDraft>,
        note: Option<String>,
    },
    Search {
        query: String,
    },
    PaymentRequest {
        amount: i64,
        memo: String,
    },
    Conversation {
        reply: String,
    },
}

//
// ================= Budget =================
//

/// Derived weekly view, recomputed from a full ledger scan on every
/// query. `remaining` goes negative when over budget; no clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyBudgetSnapshot {
    pub week_start: NaiveDateTime,
    pub week_end: NaiveDateTime,
    pub total_spent: i64,
    pub remaining: i64,
    pub percent_used: f64,
}

/// Today/month aggregation for the report command.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseReport {
    pub today_total: i64,
    pub month_total: i64,
    /// Category label → month total, top five, largest first.
    pub top_categories: Vec<(String, i64)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_category_label_round_trip() {
        for cat in Category::all() {
            assert_eq!(Category::from_label(cat.label()), Some(cat));
        }
        assert_eq!(Category::from_label("Mua sắm"), None);
    }

    #[test]
    fn test_draft_backdating() {
        let now = NaiveDate::from_ymd_opt(2025, 8, 20)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        let backdated = ExpenseDraft {
            item: "phở".to_string(),
            amount: 50_000,
            category: Category::Food,
            date: NaiveDate::from_ymd_opt(2025, 8, 15),
        };
        let record = backdated.into_record(now);
        assert_eq!(
            record.timestamp,
            NaiveDate::from_ymd_opt(2025, 8, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );

        let undated = ExpenseDraft {
            item: "xăng".to_string(),
            amount: 200_000,
            category: Category::Transport,
            date: None,
        };
        assert_eq!(undated.into_record(now).timestamp, now);
    }
}
