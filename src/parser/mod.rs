//! Rule-based parser (Tier 2)
//!
//! Deterministic fallback for the model-based interpreter: splits a
//! message into clauses, then composes the amount lexer, item extractor
//! and category classifier into one `ExpenseDraft` per clause.
//!
//! Failure policy is asymmetric by design: a clause with no
//! recognizable amount is skipped silently (the user gets credit for
//! what was understood), but a message where *every* clause fails
//! raises `NoExpenseFound`.

use crate::error::{AgentError, Result};
use crate::models::ExpenseDraft;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

pub mod amount;
pub mod category;
pub mod item;
pub mod wasteful;

lazy_static! {
    /// Clause delimiters: ASCII comma, fullwidth comma, newline family.
    static ref CLAUSE_SPLIT: Regex = Regex::new(r"[,，\n\r]+").expect("clause delimiter pattern");
}

/// Parse one clause into a draft. `None` when no amount is found.
fn parse_clause(clause: &str) -> Option<ExpenseDraft> {
    let candidates = amount::scan(clause);
    let value = amount::best(&candidates)?;

    let spans: Vec<(usize, usize)> = candidates.iter().map(|c| c.span).collect();
    let item_name = item::extract_item_name(clause, &spans);
    let category = category::categorize(&item_name);

    Some(ExpenseDraft {
        item: item_name,
        amount: value,
        category,
        date: None,
    })
}

/// Parse a message that may describe several expenses separated by
/// commas or newlines. Returns the valid subset, or `NoExpenseFound`
/// when nothing was understood.
pub fn parse_message(text: &str) -> Result<Vec<ExpenseDraft>> {
    let clauses: Vec<&str> = CLAUSE_SPLIT
        .split(text.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    debug!(clause_count = clauses.len(), "rule parser: split message");

    let mut drafts = Vec::new();
    for (i, clause) in clauses.iter().enumerate() {
        match parse_clause(clause) {
            Some(draft) => {
                debug!(
                    clause = i + 1,
                    item = %draft.item,
                    amount = draft.amount,
                    category = %draft.category,
                    "rule parser: clause accepted"
                );
                drafts.push(draft);
            }
            None => {
                debug!(clause = i + 1, text = %clause, "rule parser: clause skipped, no amount");
            }
        }
    }

    if drafts.is_empty() {
        return Err(AgentError::NoExpenseFound);
    }

    Ok(drafts)
}
